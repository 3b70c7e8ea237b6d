//! Authentication seam.
//!
//! Token issuance and account management live outside this subsystem.
//! The chat core only needs to resolve a bearer token to a caller role,
//! which is what [`AuthService`] does. The binary wires a static token
//! table; tests wire their own.

use std::collections::HashMap;

use async_trait::async_trait;

/// The resolved identity of an API caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Administrative staff.
    Admin { id: String },
    /// An authenticated visitor.
    Visitor { id: String },
    /// No credentials, or credentials we do not recognize.
    Guest,
}

impl Caller {
    /// Returns true for administrative callers.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }
}

/// Resolves a bearer token to a caller.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn resolve(&self, token: Option<&str>) -> Caller;
}

/// Fixed token table. Unknown or missing tokens resolve to guest.
#[derive(Default)]
pub struct StaticTokenAuth {
    tokens: HashMap<String, Caller>,
}

impl StaticTokenAuth {
    /// Create an empty token table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an admin token.
    pub fn with_admin(mut self, token: impl Into<String>, id: impl Into<String>) -> Self {
        self.tokens
            .insert(token.into(), Caller::Admin { id: id.into() });
        self
    }

    /// Register a visitor token.
    pub fn with_visitor(mut self, token: impl Into<String>, id: impl Into<String>) -> Self {
        self.tokens
            .insert(token.into(), Caller::Visitor { id: id.into() });
        self
    }
}

#[async_trait]
impl AuthService for StaticTokenAuth {
    async fn resolve(&self, token: Option<&str>) -> Caller {
        token
            .and_then(|t| self.tokens.get(t).cloned())
            .unwrap_or(Caller::Guest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_resolution() {
        let auth = StaticTokenAuth::new()
            .with_admin("adm", "staff-1")
            .with_visitor("vis", "user-1");

        assert_eq!(
            auth.resolve(Some("adm")).await,
            Caller::Admin {
                id: "staff-1".into()
            }
        );
        assert_eq!(
            auth.resolve(Some("vis")).await,
            Caller::Visitor {
                id: "user-1".into()
            }
        );
        assert_eq!(auth.resolve(Some("nope")).await, Caller::Guest);
        assert_eq!(auth.resolve(None).await, Caller::Guest);
    }
}
