//! Chat session and message types.

use crate::{ChatError, MessageId, Priority, SenderRole, SessionId, SessionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attachment metadata carried on a message. The file bytes themselves
/// live outside this subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name as uploaded by the sender.
    pub original_name: String,

    /// Name under which the file was stored.
    pub stored_name: String,

    /// Size in bytes.
    pub size: u64,

    /// MIME type reported at upload.
    pub mime_type: String,
}

/// A single message in a session's log.
///
/// Messages are immutable once appended: no edit, delete or reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,

    /// Who authored this message.
    pub sender_role: SenderRole,

    /// Text content. May be empty only when attachments are present.
    pub content: String,

    /// Attachment metadata, zero or more.
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// When the message was accepted by the store. Advisory only;
    /// insertion order is authoritative for ordering.
    pub sent_at: DateTime<Utc>,

    /// True for messages injected by the auto-reply engine.
    pub is_auto_reply: bool,
}

impl Message {
    /// Create a new message stamped with the current time.
    pub fn new(sender_role: SenderRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            sender_role,
            content: content.into(),
            attachments: Vec::new(),
            sent_at: Utc::now(),
            is_auto_reply: false,
        }
    }

    /// Builder method to attach files.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Builder method to flag the message as automated.
    pub fn auto_reply(mut self) -> Self {
        self.is_auto_reply = true;
        self
    }
}

/// Self-declared contact info for an unauthenticated visitor.
/// Captured once at session creation and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestIdentity {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
}

impl GuestIdentity {
    /// Validate required fields: non-blank name and a well-formed email.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.name.trim().is_empty() {
            return Err(ChatError::Validation("guest name is required".into()));
        }
        if !is_well_formed_email(&self.email) {
            return Err(ChatError::Validation(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }
}

/// Well-formed-address check: exactly one `@`, a non-empty local part,
/// and a dotted domain. Deliverability is not our problem.
fn is_well_formed_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }
    domain.split('.').count() >= 2 && !domain.starts_with('.') && !domain.ends_with('.')
}

/// The visitor side of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Visitor {
    /// An authenticated user, identified by their account id.
    Registered { user_id: String },
    /// An unauthenticated visitor with self-declared contact info.
    Guest(GuestIdentity),
}

impl Visitor {
    /// Returns true if this is a guest visitor.
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }

    /// Returns the registered user id, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Registered { user_id } => Some(user_id),
            Self::Guest(_) => None,
        }
    }

    /// Display name for list views and free-text search.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Registered { user_id } => user_id,
            Self::Guest(identity) => &identity.name,
        }
    }
}

/// A single visitor <-> support conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session identifier, assigned at creation.
    pub id: SessionId,

    /// The visitor who owns this session.
    pub visitor: Visitor,

    /// Optional subject line captured at creation.
    #[serde(default)]
    pub subject: Option<String>,

    /// Append-only message log. Insertion order is authoritative.
    pub messages: Vec<Message>,

    /// Current lifecycle status.
    pub status: SessionStatus,

    /// Admin-settable priority.
    pub priority: Priority,

    /// Messages the visitor has not yet seen (admin/system authored).
    pub unread_for_visitor: u32,

    /// Messages the admin side has not yet seen (visitor authored).
    pub unread_for_admin: u32,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// Updated on every append.
    pub last_activity_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create a new pending session with no messages.
    pub fn new(visitor: Visitor, subject: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            visitor,
            subject,
            messages: Vec::new(),
            status: SessionStatus::Pending,
            priority: Priority::Normal,
            unread_for_visitor: 0,
            unread_for_admin: 0,
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Append a message at the tail of the log, bump the opposite
    /// role's unread counter and refresh the activity timestamp.
    pub fn push_message(&mut self, message: Message) {
        match message.sender_role.unread_target() {
            SenderRole::Visitor => self.unread_for_visitor += 1,
            SenderRole::Admin => self.unread_for_admin += 1,
            SenderRole::System => {}
        }
        self.last_activity_at = message.sent_at.max(Utc::now());
        self.messages.push(message);
    }

    /// Zero the caller's own unread counter. Idempotent.
    pub fn mark_read(&mut self, by_role: SenderRole) {
        match by_role {
            SenderRole::Visitor => self.unread_for_visitor = 0,
            SenderRole::Admin | SenderRole::System => self.unread_for_admin = 0,
        }
    }

    /// Unread count as seen by the given role.
    pub fn unread_for(&self, role: SenderRole) -> u32 {
        match role {
            SenderRole::Visitor => self.unread_for_visitor,
            SenderRole::Admin | SenderRole::System => self.unread_for_admin,
        }
    }

    /// Returns true while the session is not closed.
    pub fn is_open(&self) -> bool {
        self.status != SessionStatus::Closed
    }

    /// Whether any admin has posted in this session.
    pub fn has_admin_message(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.sender_role == SenderRole::Admin)
    }

    /// Whether an automated reply has already been injected.
    pub fn has_auto_reply(&self) -> bool {
        self.messages.iter().any(|m| m.is_auto_reply)
    }

    /// Whether the given registered user owns this session.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.visitor.user_id() == Some(user_id)
    }

    /// The most recent message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Reject a message that carries neither text nor attachments.
pub fn validate_content(content: &str, attachments: &[Attachment]) -> Result<(), ChatError> {
    if content.trim().is_empty() && attachments.is_empty() {
        return Err(ChatError::Validation(
            "message content or attachments required".into(),
        ));
    }
    Ok(())
}
