//! Session list filtering.

use crate::{ChatSession, SessionStatus, Visitor};
use serde::{Deserialize, Serialize};

/// Filter for session list queries.
///
/// Free-text matching covers the visitor's name/email and the content
/// of the most recent message, case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFilter {
    /// Restrict to a single status.
    pub status: Option<SessionStatus>,

    /// Free-text query.
    pub query: Option<String>,
}

impl SessionFilter {
    /// Filter matching every session.
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict to the given status.
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to sessions matching the free-text query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Whether the given session passes this filter.
    pub fn matches(&self, session: &ChatSession) -> bool {
        if let Some(status) = self.status {
            if session.status != status {
                return false;
            }
        }
        match &self.query {
            None => true,
            Some(q) if q.trim().is_empty() => true,
            Some(q) => {
                let needle = q.to_lowercase();
                let mut haystacks: Vec<&str> = vec![session.visitor.display_name()];
                if let Visitor::Guest(identity) = &session.visitor {
                    haystacks.push(&identity.email);
                }
                if let Some(last) = session.last_message() {
                    haystacks.push(&last.content);
                }
                haystacks
                    .iter()
                    .any(|h| h.to_lowercase().contains(&needle))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GuestIdentity, Message, SenderRole};

    fn session() -> ChatSession {
        let mut s = ChatSession::new(
            Visitor::Guest(GuestIdentity {
                name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                subject: None,
            }),
            None,
        );
        s.push_message(Message::new(SenderRole::Visitor, "my invoice is wrong"));
        s
    }

    #[test]
    fn test_status_filter() {
        let s = session();
        assert!(SessionFilter::any()
            .with_status(SessionStatus::Pending)
            .matches(&s));
        assert!(!SessionFilter::any()
            .with_status(SessionStatus::Closed)
            .matches(&s));
    }

    #[test]
    fn test_query_matches_name_email_and_last_message() {
        let s = session();
        assert!(SessionFilter::any().with_query("lovelace").matches(&s));
        assert!(SessionFilter::any().with_query("ada@example").matches(&s));
        assert!(SessionFilter::any().with_query("INVOICE").matches(&s));
        assert!(!SessionFilter::any().with_query("refund").matches(&s));
    }
}
