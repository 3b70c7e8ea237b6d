//! Deskchat Server Library
//!
//! Server side of the support-chat subsystem: the authoritative session
//! store, the role-aware session service, the auto-reply engine and the
//! HTTP surface polled by the visitor widget and the admin console.

pub mod auth;
pub mod auto_reply;
pub mod config;
pub mod http;
pub mod notify;
pub mod service;
pub mod state;
pub mod store;

pub use auth::{AuthService, Caller, StaticTokenAuth};
pub use auto_reply::{AutoReplyConfig, AutoReplyEngine};
pub use config::ServerConfig;
pub use notify::{LogSink, NotificationSink};
pub use service::{ChatSessionService, UnreadSummary};
pub use state::AppState;
pub use store::ChatStore;
