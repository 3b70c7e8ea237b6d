//! Authoritative chat session store.
//!
//! The message log is append-only and is the single source of truth;
//! both the visitor widget and the admin console are read/append
//! clients. Appends go through the session map's write lock, so two
//! concurrent appends to the same session can never interleave out of
//! submission order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use deskchat_core::{
    validate_content, Attachment, ChatError, ChatSession, Message, Priority, SenderRole,
    SessionFilter, SessionId, SessionStatus, Visitor,
};

use crate::notify::NotificationSink;

/// Durable representation of chat sessions and their message logs.
///
/// Sessions are never hard-deleted; `closed` is terminal but the
/// session is retained for audit and export.
pub struct ChatStore {
    sessions: RwLock<HashMap<SessionId, ChatSession>>,
    notifier: Arc<dyn NotificationSink>,
}

impl ChatStore {
    /// Create an empty store reporting unread changes to `notifier`.
    pub fn new(notifier: Arc<dyn NotificationSink>) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            notifier,
        })
    }

    /// Create a new pending session holding the visitor's first message.
    pub async fn create_session(
        &self,
        visitor: Visitor,
        subject: Option<String>,
        first_message: &str,
        attachments: Vec<Attachment>,
    ) -> Result<ChatSession, ChatError> {
        if let Visitor::Guest(identity) = &visitor {
            identity.validate()?;
        }
        validate_content(first_message, &attachments)?;

        let mut session = ChatSession::new(visitor, subject);
        let message =
            Message::new(SenderRole::Visitor, first_message).with_attachments(attachments);
        session.push_message(message);

        let snapshot = session.clone();
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);

        info!(session_id = %snapshot.id, guest = snapshot.visitor.is_guest(), "Session created");
        self.notifier.unread_changed(&snapshot);
        Ok(snapshot)
    }

    /// Append a message at the end of a session's log.
    ///
    /// Bumps the opposite role's unread counter and refreshes
    /// `last_activity_at`.
    pub async fn append_message(
        &self,
        session_id: &SessionId,
        sender_role: SenderRole,
        content: &str,
        attachments: Vec<Attachment>,
        is_auto_reply: bool,
    ) -> Result<Message, ChatError> {
        validate_content(content, &attachments)?;

        let mut message = Message::new(sender_role, content).with_attachments(attachments);
        if is_auto_reply {
            message = message.auto_reply();
        }

        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| ChatError::NotFound(session_id.to_string()))?;
            session.push_message(message.clone());
            session.clone()
        };

        info!(
            session_id = %session_id,
            sender_role = ?sender_role,
            auto_reply = is_auto_reply,
            "Message appended"
        );
        self.notifier.unread_changed(&snapshot);
        Ok(message)
    }

    /// Change a session's status.
    ///
    /// Any status is settable except moving away from `closed` or
    /// back into `pending`; re-asserting the current status succeeds.
    pub async fn set_status(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<ChatSession, ChatError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ChatError::NotFound(session_id.to_string()))?;

        if !session.status.can_transition_to(status) {
            return Err(ChatError::InvalidStateTransition {
                from: format!("{:?}", session.status).to_lowercase(),
                to: format!("{:?}", status).to_lowercase(),
            });
        }

        session.status = status;
        info!(session_id = %session_id, status = ?status, "Status changed");
        Ok(session.clone())
    }

    /// Change a session's priority.
    pub async fn set_priority(
        &self,
        session_id: &SessionId,
        priority: Priority,
    ) -> Result<ChatSession, ChatError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ChatError::NotFound(session_id.to_string()))?;
        session.priority = priority;
        Ok(session.clone())
    }

    /// Zero the caller's own unread counter. Idempotent.
    pub async fn mark_read(
        &self,
        session_id: &SessionId,
        by_role: SenderRole,
    ) -> Result<(), ChatError> {
        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| ChatError::NotFound(session_id.to_string()))?;
            session.mark_read(by_role);
            session.clone()
        };
        self.notifier.unread_changed(&snapshot);
        Ok(())
    }

    /// Fetch a session snapshot.
    pub async fn get_session(&self, session_id: &SessionId) -> Result<ChatSession, ChatError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| ChatError::NotFound(session_id.to_string()))
    }

    /// List sessions matching `filter`, most recently active first.
    pub async fn list_sessions(&self, filter: &SessionFilter) -> Vec<ChatSession> {
        let sessions = self.sessions.read().await;
        let mut matched: Vec<ChatSession> = sessions
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        matched
    }

    /// Find the registered visitor's open (non-closed) session.
    ///
    /// The single-open-session invariant means at most one should ever
    /// exist; if more than one does, the most recently active wins.
    pub async fn find_open_session_for_visitor(&self, user_id: &str) -> Option<ChatSession> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|s| s.is_open() && s.is_owned_by(user_id))
            .max_by_key(|s| s.last_activity_at)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogSink;
    use deskchat_core::GuestIdentity;

    fn store() -> Arc<ChatStore> {
        ChatStore::new(Arc::new(LogSink))
    }

    fn guest_visitor() -> Visitor {
        Visitor::Guest(GuestIdentity {
            name: "A".into(),
            email: "a@x.com".into(),
            subject: None,
        })
    }

    #[tokio::test]
    async fn test_create_session_rejects_bad_input() {
        let store = store();
        let bad_email = Visitor::Guest(GuestIdentity {
            name: "A".into(),
            email: "not-an-email".into(),
            subject: None,
        });
        assert!(matches!(
            store.create_session(bad_email, None, "hi", vec![]).await,
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            store
                .create_session(guest_visitor(), None, "  ", vec![])
                .await,
            Err(ChatError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_append_unknown_session() {
        let store = store();
        let result = store
            .append_message(
                &SessionId::new("missing"),
                SenderRole::Visitor,
                "hi",
                vec![],
                false,
            )
            .await;
        assert!(matches!(result, Err(ChatError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = store();
        let session = store
            .create_session(guest_visitor(), None, "first", vec![])
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            let id = session.id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_message(&id, SenderRole::Visitor, &format!("msg {}", i), vec![], false)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let session = store.get_session(&session.id).await.unwrap();
        // 1 initial + 50 concurrent, none lost
        assert_eq!(session.messages.len(), 51);
        assert_eq!(session.unread_for_admin, 51);
    }

    #[tokio::test]
    async fn test_closed_is_terminal() {
        let store = store();
        let session = store
            .create_session(guest_visitor(), None, "hi", vec![])
            .await
            .unwrap();

        store
            .set_status(&session.id, SessionStatus::Closed)
            .await
            .unwrap();
        let result = store.set_status(&session.id, SessionStatus::Active).await;
        assert!(matches!(
            result,
            Err(ChatError::InvalidStateTransition { .. })
        ));

        // re-closing is a no-op, not a conflict
        let reclosed = store
            .set_status(&session.id, SessionStatus::Closed)
            .await
            .unwrap();
        assert_eq!(reclosed.status, SessionStatus::Closed);
    }

    #[tokio::test]
    async fn test_mark_read_resets_counter() {
        let store = store();
        let session = store
            .create_session(guest_visitor(), None, "hi", vec![])
            .await
            .unwrap();
        assert_eq!(session.unread_for_admin, 1);

        store
            .mark_read(&session.id, SenderRole::Admin)
            .await
            .unwrap();
        let session = store.get_session(&session.id).await.unwrap();
        assert_eq!(session.unread_for_admin, 0);

        store
            .append_message(&session.id, SenderRole::Visitor, "again", vec![], false)
            .await
            .unwrap();
        let session = store.get_session(&session.id).await.unwrap();
        assert_eq!(session.unread_for_admin, 1);
    }

    #[tokio::test]
    async fn test_list_sessions_ordered_by_activity() {
        let store = store();
        let first = store
            .create_session(guest_visitor(), None, "one", vec![])
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store
            .create_session(guest_visitor(), None, "two", vec![])
            .await
            .unwrap();

        let listed = store.list_sessions(&SessionFilter::any()).await;
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        // bump the first session, it should move to the front
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .append_message(&first.id, SenderRole::Admin, "reply", vec![], false)
            .await
            .unwrap();
        let listed = store.list_sessions(&SessionFilter::any()).await;
        assert_eq!(listed[0].id, first.id);
    }

    #[tokio::test]
    async fn test_list_sessions_filters() {
        let store = store();
        let session = store
            .create_session(guest_visitor(), None, "billing question", vec![])
            .await
            .unwrap();
        store
            .set_status(&session.id, SessionStatus::Active)
            .await
            .unwrap();
        store
            .create_session(guest_visitor(), None, "other topic", vec![])
            .await
            .unwrap();

        let active = store
            .list_sessions(&SessionFilter::any().with_status(SessionStatus::Active))
            .await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, session.id);

        let billing = store
            .list_sessions(&SessionFilter::any().with_query("billing"))
            .await;
        assert_eq!(billing.len(), 1);
    }

    #[tokio::test]
    async fn test_find_open_session_prefers_most_recent() {
        let store = store();
        let visitor = Visitor::Registered {
            user_id: "user-1".into(),
        };
        let older = store
            .create_session(visitor.clone(), None, "one", vec![])
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = store
            .create_session(visitor, None, "two", vec![])
            .await
            .unwrap();

        let found = store.find_open_session_for_visitor("user-1").await.unwrap();
        assert_eq!(found.id, newer.id);

        store
            .set_status(&newer.id, SessionStatus::Closed)
            .await
            .unwrap();
        let found = store.find_open_session_for_visitor("user-1").await.unwrap();
        assert_eq!(found.id, older.id);

        store
            .set_status(&older.id, SessionStatus::Closed)
            .await
            .unwrap();
        assert!(store.find_open_session_for_visitor("user-1").await.is_none());
    }
}
