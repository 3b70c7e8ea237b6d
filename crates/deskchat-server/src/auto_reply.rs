//! Automatic replies for admin-silent conversations.
//!
//! When a visitor message arrives and no admin has posted in the
//! session yet, the engine schedules one canned reply after a delay.
//! An admin answering inside the delay cancels the timer; additional
//! visitor messages replace it rather than stacking. At most one
//! automated message is injected per silence window, and the window
//! only ever ends when an admin posts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use deskchat_core::{SenderRole, SessionId};

use crate::store::ChatStore;

/// Operator-configurable auto-reply settings.
///
/// Held behind the engine and swapped wholesale via
/// [`AutoReplyEngine::reload`]; there is no ambient global state.
#[derive(Debug, Clone)]
pub struct AutoReplyConfig {
    /// Master toggle.
    pub enabled: bool,

    /// Delay between the triggering message and delivery. Models
    /// "an admin might answer first".
    pub delay: Duration,

    /// Operator keyword table, checked before the built-in patterns.
    /// First entry whose keyword occurs in the message wins.
    pub keyword_replies: Vec<(String, String)>,

    /// Reply for messages matching urgent/emergency.
    pub expedited_message: String,

    /// Reply for messages matching price/cost.
    pub pricing_message: String,

    /// Reply for messages matching support/help/issue.
    pub support_message: String,

    /// Fallback when nothing else matches.
    pub default_message: String,
}

impl Default for AutoReplyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: Duration::from_secs(30),
            keyword_replies: Vec::new(),
            expedited_message: "We've flagged your message for an expedited response. \
                 Someone from our team will be with you as soon as possible."
                .to_string(),
            pricing_message: "Thanks for your pricing inquiry! An agent will follow up \
                 with details shortly."
                .to_string(),
            support_message: "Thanks for reaching out to support. We've received your \
                 message and an agent will respond soon."
                .to_string(),
            default_message: "Thanks for your message! Our team will get back to you \
                 shortly."
                .to_string(),
        }
    }
}

impl AutoReplyConfig {
    /// Pick the reply for a visitor message, in priority order:
    /// operator keyword table, built-in patterns, default.
    pub fn select_reply(&self, content: &str) -> String {
        let lowered = content.to_lowercase();

        for (keyword, reply) in &self.keyword_replies {
            if lowered.contains(&keyword.to_lowercase()) {
                return reply.clone();
            }
        }

        if ["urgent", "emergency"].iter().any(|p| lowered.contains(p)) {
            return self.expedited_message.clone();
        }
        if ["price", "cost"].iter().any(|p| lowered.contains(p)) {
            return self.pricing_message.clone();
        }
        if ["support", "help", "issue"]
            .iter()
            .any(|p| lowered.contains(p))
        {
            return self.support_message.clone();
        }

        self.default_message.clone()
    }
}

/// Schedules and delivers automated replies.
pub struct AutoReplyEngine {
    store: Arc<ChatStore>,
    config: RwLock<AutoReplyConfig>,
    // One timer per session. Handles of delivered replies are swept on
    // the next schedule; a timer never removes its own entry, so it
    // cannot race a replacement.
    pending: Mutex<HashMap<SessionId, JoinHandle<()>>>,
}

impl AutoReplyEngine {
    /// Create an engine over the given store and configuration.
    pub fn new(store: Arc<ChatStore>, config: AutoReplyConfig) -> Arc<Self> {
        Arc::new(Self {
            store,
            config: RwLock::new(config),
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Swap in a fresh operator configuration. Takes effect for the
    /// next evaluation; already-scheduled timers keep their reply.
    pub async fn reload(&self, config: AutoReplyConfig) {
        *self.config.write().await = config;
    }

    /// Evaluate a visitor-authored append.
    ///
    /// Fires only when auto-reply is enabled, the session has zero
    /// admin-authored messages, and no automated reply has been sent in
    /// the current silence window. Scheduling while a timer is already
    /// pending for the session replaces it.
    pub async fn on_visitor_message(&self, session_id: &SessionId, content: &str) {
        let (enabled, delay, reply) = {
            let config = self.config.read().await;
            (
                config.enabled,
                config.delay,
                config.select_reply(content),
            )
        };
        if !enabled {
            return;
        }

        match self.store.get_session(session_id).await {
            Ok(session) => {
                if session.has_admin_message() || session.has_auto_reply() {
                    debug!(session_id = %session_id, "Auto-reply gate closed, not scheduling");
                    return;
                }
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Auto-reply lookup failed");
                return;
            }
        }

        let store = self.store.clone();
        let id = session_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            deliver(store, id, reply).await;
        });

        debug!(session_id = %session_id, delay_secs = delay.as_secs(), "Auto-reply scheduled");
        let mut pending = self.pending.lock().await;
        pending.retain(|_, h| !h.is_finished());
        if let Some(old) = pending.insert(session_id.clone(), handle) {
            // replace, never stack
            old.abort();
        }
    }

    /// Cancel the pending timer for a session. Invoked when an admin
    /// posts: a human answered, no automated reply must follow.
    pub async fn cancel(&self, session_id: &SessionId) {
        if let Some(handle) = self.pending.lock().await.remove(session_id) {
            handle.abort();
            debug!(session_id = %session_id, "Pending auto-reply cancelled");
        }
    }
}

/// Deliver a scheduled reply. Re-checks the gate against a fresh
/// snapshot: the admin may have answered or the session may have been
/// closed while the timer ran. Failures are logged and swallowed; they
/// never surface into the visitor-facing append path.
async fn deliver(store: Arc<ChatStore>, session_id: SessionId, reply: String) {
    match store.get_session(&session_id).await {
        Ok(session) => {
            if session.has_admin_message() || session.has_auto_reply() || !session.is_open() {
                debug!(session_id = %session_id, "Auto-reply suppressed at delivery time");
                return;
            }
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Auto-reply delivery lookup failed");
            return;
        }
    }

    match store
        .append_message(&session_id, SenderRole::System, &reply, vec![], true)
        .await
    {
        Ok(_) => info!(session_id = %session_id, "Auto-reply delivered"),
        Err(e) => warn!(session_id = %session_id, error = %e, "Auto-reply delivery failed"),
    }
}
