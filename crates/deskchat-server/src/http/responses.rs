//! HTTP request and response types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use deskchat_core::{Attachment, ChatError, Priority, SessionStatus};

/// Uniform response envelope: `{success, data?, message?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Failed response carrying an operator-readable message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Map a domain error to its HTTP status code.
pub fn error_status(error: &ChatError) -> StatusCode {
    match error {
        ChatError::Validation(_) => StatusCode::BAD_REQUEST,
        ChatError::Forbidden(_) => StatusCode::FORBIDDEN,
        ChatError::NotFound(_) => StatusCode::NOT_FOUND,
        ChatError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
    }
}

/// Build the envelope response for a domain error.
pub fn error_response(error: ChatError) -> Response {
    let status = error_status(&error);
    (status, Json(ApiResponse::<()>::fail(error.to_string()))).into_response()
}

/// 401 for routes that require credentials the caller did not present.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()>::fail("authentication required")),
    )
        .into_response()
}

// ============================================================================
// Request bodies
// ============================================================================

/// Body for `POST /chat` (authenticated visitor).
#[derive(Debug, Deserialize)]
pub struct StartChatRequest {
    pub message: String,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Body for `POST /chat/public` (guest).
#[derive(Debug, Deserialize)]
pub struct GuestChatRequest {
    pub name: String,
    pub email: String,

    #[serde(default)]
    pub subject: Option<String>,

    pub message: String,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Body for message appends on both surfaces.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Body for `PUT /chat/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: SessionStatus,
}

/// Body for `PUT /chat/{id}/priority`.
#[derive(Debug, Deserialize)]
pub struct UpdatePriorityRequest {
    pub priority: Priority,
}

/// Query string for `GET /chat`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<SessionStatus>,

    #[serde(default)]
    pub q: Option<String>,
}
