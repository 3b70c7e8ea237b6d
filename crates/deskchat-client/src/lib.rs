//! Deskchat Polling Sync Client
//!
//! Keeps a local view of one chat session consistent with the server
//! without a persistent connection. The visitor widget and the admin
//! console use the same client: fetch a snapshot on a fixed interval,
//! diff against the last-known message count and render only the
//! suffix of new messages.

pub mod api;
pub mod error;
pub mod poller;

pub use api::ApiClient;
pub use error::ClientError;
pub use poller::{
    ChatView, GuestFetcher, PollConfig, PollerHandle, PollingSyncClient, SessionFetcher,
};
