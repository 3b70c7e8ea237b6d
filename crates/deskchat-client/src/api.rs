//! HTTP client for the chat REST endpoints.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use deskchat_core::{Attachment, ChatSession, GuestIdentity, Message, SessionId};

use crate::error::ClientError;

/// Bounded per-request timeout. Requests past this are abandoned,
/// not retried indefinitely; the poll loop retries on its next tick.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Response envelope used by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct StartChatBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct GuestChatBody<'a> {
    name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct PostMessageBody<'a> {
    content: &'a str,
    attachments: &'a [Attachment],
}

/// HTTP client for the chat API.
pub struct ApiClient {
    inner: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new client against the given base URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let inner = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attach a bearer token (admin or authenticated visitor).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Check if the server is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "Checking health");
        let response = self.inner.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    /// Fetch a session snapshot through the authenticated surface.
    pub async fn get_session(&self, id: &SessionId) -> Result<ChatSession, ClientError> {
        self.get_json(&format!("/chat/{}", id)).await
    }

    /// Fetch a guest session snapshot through the public surface.
    pub async fn get_guest_session(&self, id: &SessionId) -> Result<ChatSession, ClientError> {
        self.get_json(&format!("/chat/public/{}", id)).await
    }

    /// Start (or continue) the authenticated visitor's chat.
    pub async fn start_chat(
        &self,
        subject: Option<&str>,
        message: &str,
    ) -> Result<ChatSession, ClientError> {
        self.post_json("/chat", &StartChatBody { message, subject })
            .await
    }

    /// Start a new guest chat. The caller must persist the returned
    /// session id; it is the only handle a guest has on the thread.
    pub async fn start_guest_chat(
        &self,
        identity: &GuestIdentity,
        message: &str,
    ) -> Result<ChatSession, ClientError> {
        self.post_json(
            "/chat/public",
            &GuestChatBody {
                name: &identity.name,
                email: &identity.email,
                subject: identity.subject.as_deref(),
                message,
            },
        )
        .await
    }

    /// Append a message through the authenticated surface.
    pub async fn post_message(
        &self,
        id: &SessionId,
        content: &str,
        attachments: &[Attachment],
    ) -> Result<Message, ClientError> {
        self.post_json(
            &format!("/chat/{}/message", id),
            &PostMessageBody {
                content,
                attachments,
            },
        )
        .await
    }

    /// Append a message to a guest session through the public surface.
    pub async fn post_guest_message(
        &self,
        id: &SessionId,
        content: &str,
        attachments: &[Attachment],
    ) -> Result<Message, ClientError> {
        self.post_json(
            &format!("/chat/public/{}/message", id),
            &PostMessageBody {
                content,
                attachments,
            },
        )
        .await
    }

    /// Mark the session read for the caller's side.
    pub async fn mark_read(&self, id: &SessionId) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .post_json(&format!("/chat/{}/read", id), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.inner.request(method, &url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!(path = %path, "GET request");
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Self::unwrap_envelope(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        debug!(path = %path, "POST request");
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))?;

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "request failed".to_string()),
            });
        }
        envelope.data.ok_or_else(|| {
            ClientError::Serialization("missing data in success envelope".to_string())
        })
    }
}
