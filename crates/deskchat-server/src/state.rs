//! Shared application state.

use std::sync::Arc;

use crate::auth::AuthService;
use crate::auto_reply::{AutoReplyConfig, AutoReplyEngine};
use crate::notify::{LogSink, NotificationSink};
use crate::service::ChatSessionService;
use crate::store::ChatStore;

/// Shared application state handed to every HTTP handler.
pub struct AppState {
    /// Role-aware chat logic.
    pub service: ChatSessionService,

    /// Resolves bearer tokens to callers.
    pub auth: Arc<dyn AuthService>,
}

impl AppState {
    /// Wire up store, auto-reply engine and service, wrapped in Arc.
    pub fn new(auth: Arc<dyn AuthService>, auto_reply: AutoReplyConfig) -> Arc<Self> {
        Self::with_sink(auth, auto_reply, Arc::new(LogSink))
    }

    /// Same as [`AppState::new`] with a custom notification sink.
    pub fn with_sink(
        auth: Arc<dyn AuthService>,
        auto_reply: AutoReplyConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Arc<Self> {
        let store = ChatStore::new(sink);
        let engine = AutoReplyEngine::new(store.clone(), auto_reply);
        Arc::new(Self {
            service: ChatSessionService::new(store, engine),
            auth,
        })
    }
}
