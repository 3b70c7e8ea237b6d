//! Deskchat Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Database
//! - Runtime specifics
//!
//! All types here represent the core business domain of Deskchat:
//! support-chat sessions, their message logs, and the typed errors
//! the store and service layers raise.

pub mod error;
pub mod filter;
pub mod ids;
pub mod session;
pub mod status;

// Re-export commonly used types
pub use error::ChatError;
pub use filter::SessionFilter;
pub use ids::{MessageId, SessionId};
pub use session::{validate_content, Attachment, ChatSession, GuestIdentity, Message, Visitor};
pub use status::{Priority, SenderRole, SessionStatus};
