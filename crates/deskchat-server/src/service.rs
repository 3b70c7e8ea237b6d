//! Role-aware session service.
//!
//! Wraps the store with authorization and guest-vs-authenticated
//! branching, and wires visitor appends into the auto-reply engine.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use deskchat_core::{
    Attachment, ChatError, ChatSession, GuestIdentity, Message, Priority, SenderRole,
    SessionFilter, SessionId, SessionStatus, Visitor,
};

use crate::auth::Caller;
use crate::auto_reply::AutoReplyEngine;
use crate::store::ChatStore;

/// Aggregate unread counts for the caller.
#[derive(Debug, Clone, Serialize)]
pub struct UnreadSummary {
    /// Sum over all visible sessions.
    pub total: u32,

    /// Per-session breakdown, sessions with unread messages only.
    pub sessions: Vec<SessionUnread>,
}

/// One session's contribution to the unread summary.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUnread {
    pub session_id: SessionId,
    pub unread: u32,
}

/// Server-side chat logic over the store and the auto-reply engine.
#[derive(Clone)]
pub struct ChatSessionService {
    store: Arc<ChatStore>,
    auto_reply: Arc<AutoReplyEngine>,
}

impl ChatSessionService {
    pub fn new(store: Arc<ChatStore>, auto_reply: Arc<AutoReplyEngine>) -> Self {
        Self { store, auto_reply }
    }

    /// Start (or continue) an authenticated visitor's chat.
    ///
    /// At most one open session per registered visitor: when an open
    /// session exists the message is appended there instead of
    /// creating a duplicate. A visitor whose previous session is
    /// closed gets a fresh one.
    pub async fn start_authenticated_chat(
        &self,
        user_id: &str,
        subject: Option<String>,
        message: &str,
        attachments: Vec<Attachment>,
    ) -> Result<ChatSession, ChatError> {
        if let Some(existing) = self.store.find_open_session_for_visitor(user_id).await {
            info!(session_id = %existing.id, user_id, "Appending to existing open session");
            self.store
                .append_message(&existing.id, SenderRole::Visitor, message, attachments, false)
                .await?;
            self.auto_reply.on_visitor_message(&existing.id, message).await;
            return self.store.get_session(&existing.id).await;
        }

        let session = self
            .store
            .create_session(
                Visitor::Registered {
                    user_id: user_id.to_string(),
                },
                subject,
                message,
                attachments,
            )
            .await?;
        self.auto_reply.on_visitor_message(&session.id, message).await;
        Ok(session)
    }

    /// Start a guest chat. Always creates: guests have no stable
    /// identity across requests beyond the session id itself, which
    /// the client persists.
    pub async fn start_guest_chat(
        &self,
        identity: GuestIdentity,
        message: &str,
        attachments: Vec<Attachment>,
    ) -> Result<ChatSession, ChatError> {
        let subject = identity.subject.clone();
        let session = self
            .store
            .create_session(Visitor::Guest(identity), subject, message, attachments)
            .await?;
        self.auto_reply.on_visitor_message(&session.id, message).await;
        Ok(session)
    }

    /// Append a message on behalf of a caller.
    ///
    /// Admins may post to any session; a visitor only to their own;
    /// a guest (unauthenticated, via the public endpoint) only to
    /// guest sessions.
    pub async fn post_message(
        &self,
        session_id: &SessionId,
        caller: &Caller,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Result<Message, ChatError> {
        let session = self.store.get_session(session_id).await?;

        let sender_role = match caller {
            Caller::Admin { .. } => SenderRole::Admin,
            Caller::Visitor { id } => {
                if !session.is_owned_by(id) {
                    return Err(ChatError::Forbidden(
                        "not a participant of this session".into(),
                    ));
                }
                SenderRole::Visitor
            }
            Caller::Guest => {
                if !session.visitor.is_guest() {
                    return Err(ChatError::Forbidden(
                        "session requires authentication".into(),
                    ));
                }
                SenderRole::Visitor
            }
        };

        let message = self
            .store
            .append_message(session_id, sender_role, content, attachments, false)
            .await?;

        match sender_role {
            SenderRole::Visitor => {
                self.auto_reply.on_visitor_message(session_id, content).await;
            }
            SenderRole::Admin => {
                // a human answered; a pending automated reply must not fire
                self.auto_reply.cancel(session_id).await;
            }
            SenderRole::System => {}
        }

        Ok(message)
    }

    /// Change a session's status. Admin only.
    pub async fn set_status(
        &self,
        session_id: &SessionId,
        caller: &Caller,
        status: SessionStatus,
    ) -> Result<ChatSession, ChatError> {
        if !caller.is_admin() {
            return Err(ChatError::Forbidden("status changes are admin-only".into()));
        }
        self.store.set_status(session_id, status).await
    }

    /// Change a session's priority. Admin only.
    pub async fn set_priority(
        &self,
        session_id: &SessionId,
        caller: &Caller,
        priority: Priority,
    ) -> Result<ChatSession, ChatError> {
        if !caller.is_admin() {
            return Err(ChatError::Forbidden(
                "priority changes are admin-only".into(),
            ));
        }
        self.store.set_priority(session_id, priority).await
    }

    /// Mark the session read for the caller's side.
    pub async fn mark_read(
        &self,
        session_id: &SessionId,
        caller: &Caller,
    ) -> Result<(), ChatError> {
        let session = self.store.get_session(session_id).await?;
        let role = match caller {
            Caller::Admin { .. } => SenderRole::Admin,
            Caller::Visitor { id } => {
                if !session.is_owned_by(id) {
                    return Err(ChatError::Forbidden(
                        "not a participant of this session".into(),
                    ));
                }
                SenderRole::Visitor
            }
            Caller::Guest => {
                if !session.visitor.is_guest() {
                    return Err(ChatError::Forbidden(
                        "session requires authentication".into(),
                    ));
                }
                SenderRole::Visitor
            }
        };
        self.store.mark_read(session_id, role).await
    }

    /// Fetch a session. Admin or owning visitor; guests may fetch
    /// guest sessions (the widget polls through the public surface).
    pub async fn get_session(
        &self,
        session_id: &SessionId,
        caller: &Caller,
    ) -> Result<ChatSession, ChatError> {
        let session = self.store.get_session(session_id).await?;
        let allowed = match caller {
            Caller::Admin { .. } => true,
            Caller::Visitor { id } => session.is_owned_by(id),
            Caller::Guest => session.visitor.is_guest(),
        };
        if !allowed {
            return Err(ChatError::Forbidden(
                "not a participant of this session".into(),
            ));
        }
        Ok(session)
    }

    /// List sessions. Admin only.
    pub async fn list_sessions(
        &self,
        filter: &SessionFilter,
        caller: &Caller,
    ) -> Result<Vec<ChatSession>, ChatError> {
        if !caller.is_admin() {
            return Err(ChatError::Forbidden("session list is admin-only".into()));
        }
        Ok(self.store.list_sessions(filter).await)
    }

    /// Aggregate unread counts across sessions visible to the caller:
    /// all sessions for admins, the single open session for a visitor.
    pub async fn unread_summary(&self, caller: &Caller) -> Result<UnreadSummary, ChatError> {
        match caller {
            Caller::Admin { .. } => {
                let sessions = self.store.list_sessions(&SessionFilter::any()).await;
                let per_session: Vec<SessionUnread> = sessions
                    .iter()
                    .filter(|s| s.unread_for_admin > 0)
                    .map(|s| SessionUnread {
                        session_id: s.id.clone(),
                        unread: s.unread_for_admin,
                    })
                    .collect();
                Ok(UnreadSummary {
                    total: per_session.iter().map(|s| s.unread).sum(),
                    sessions: per_session,
                })
            }
            Caller::Visitor { id } => {
                let sessions = match self.store.find_open_session_for_visitor(id).await {
                    Some(s) if s.unread_for_visitor > 0 => vec![SessionUnread {
                        session_id: s.id.clone(),
                        unread: s.unread_for_visitor,
                    }],
                    _ => Vec::new(),
                };
                Ok(UnreadSummary {
                    total: sessions.iter().map(|s| s.unread).sum(),
                    sessions,
                })
            }
            Caller::Guest => Err(ChatError::Forbidden(
                "unread summary requires authentication".into(),
            )),
        }
    }
}
