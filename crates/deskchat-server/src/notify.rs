//! Notification sink for unread-badge updates.

use deskchat_core::ChatSession;
use tracing::debug;

/// Receives unread-counter changes after every append and mark-read.
///
/// The store invokes the sink outside its session lock, with a snapshot
/// of the updated session. The UI layer plugs its badge updater in here.
pub trait NotificationSink: Send + Sync {
    fn unread_changed(&self, session: &ChatSession);
}

/// Default sink: logs the counters.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn unread_changed(&self, session: &ChatSession) {
        debug!(
            session_id = %session.id,
            unread_for_admin = session.unread_for_admin,
            unread_for_visitor = session.unread_for_visitor,
            "Unread counters changed"
        );
    }
}
