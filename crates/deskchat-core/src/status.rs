//! Role, status and priority enums for chat sessions.

use serde::{Deserialize, Serialize};

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    /// The visitor side (authenticated user or guest).
    Visitor,
    /// Administrative staff.
    Admin,
    /// Automated message (auto-replies).
    System,
}

impl SenderRole {
    /// The role whose unread counter an append by this role bumps.
    ///
    /// System messages are shown on the admin side of the transcript,
    /// so they count as unread for the visitor.
    pub fn unread_target(&self) -> Self {
        match self {
            Self::Visitor => Self::Admin,
            Self::Admin | Self::System => Self::Visitor,
        }
    }
}

/// Lifecycle status of a chat session.
///
/// Transitions are admin-driven except creation (-> pending).
/// `closed` is terminal; `pending` is entered only at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session created, no admin has opened it yet.
    #[default]
    Pending,
    /// An admin is handling the session.
    Active,
    /// Marked resolved by an admin (can be reopened).
    Resolved,
    /// Closed for good. Retained for audit, never reopened.
    Closed,
}

impl SessionStatus {
    /// Returns true if the session can never leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether an admin may move a session from `self` to `to`.
    ///
    /// Re-asserting the current status is an idempotent no-op, so a
    /// repeated close does not conflict.
    pub fn can_transition_to(&self, to: Self) -> bool {
        if *self == to {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        // pending is creation-only
        to != Self::Pending
    }
}

/// Admin-settable priority. Metadata only: does not affect
/// message ordering or polling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_is_terminal() {
        assert!(SessionStatus::Closed.is_terminal());
        assert!(!SessionStatus::Closed.can_transition_to(SessionStatus::Active));
        assert!(!SessionStatus::Closed.can_transition_to(SessionStatus::Resolved));
    }

    #[test]
    fn test_same_status_is_a_no_op() {
        assert!(SessionStatus::Closed.can_transition_to(SessionStatus::Closed));
        assert!(SessionStatus::Active.can_transition_to(SessionStatus::Active));
        assert!(SessionStatus::Pending.can_transition_to(SessionStatus::Pending));
    }

    #[test]
    fn test_pending_is_creation_only() {
        assert!(!SessionStatus::Active.can_transition_to(SessionStatus::Pending));
        assert!(SessionStatus::Pending.can_transition_to(SessionStatus::Active));
        assert!(SessionStatus::Resolved.can_transition_to(SessionStatus::Active));
        assert!(SessionStatus::Active.can_transition_to(SessionStatus::Closed));
    }

    #[test]
    fn test_unread_target() {
        assert_eq!(SenderRole::Visitor.unread_target(), SenderRole::Admin);
        assert_eq!(SenderRole::Admin.unread_target(), SenderRole::Visitor);
        assert_eq!(SenderRole::System.unread_target(), SenderRole::Visitor);
    }

    #[test]
    fn test_wire_casing() {
        let json = serde_json::to_string(&SessionStatus::Resolved).unwrap();
        assert_eq!(json, "\"resolved\"");
        let role: SenderRole = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(role, SenderRole::System);
    }
}
