//! Server configuration.

use crate::auto_reply::AutoReplyConfig;

/// Server configuration.
pub struct ServerConfig {
    /// HTTP bind address.
    pub bind_addr: String,

    /// Operator auto-reply settings.
    pub auto_reply: AutoReplyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            auto_reply: AutoReplyConfig::default(),
        }
    }
}
