//! Fixed-interval polling loop with suffix-diff rendering.
//!
//! The loop fetches a full session snapshot every tick, compares the
//! message count against the last-known count and hands the view only
//! the suffix of new messages. A snapshot with fewer messages than
//! last seen is a late response from an older request and is dropped.
//! Failures are retried on the next tick; already-rendered messages
//! are never cleared.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use deskchat_core::{ChatSession, Message, SessionId};

use crate::api::ApiClient;
use crate::error::ClientError;

/// Fetches one session snapshot. Abstracted so the poll loop can be
/// driven without a network in tests.
#[async_trait]
pub trait SessionFetcher: Send + Sync + 'static {
    async fn fetch(&self, session_id: &SessionId) -> Result<ChatSession, ClientError>;
}

#[async_trait]
impl SessionFetcher for ApiClient {
    async fn fetch(&self, session_id: &SessionId) -> Result<ChatSession, ClientError> {
        self.get_session(session_id).await
    }
}

/// Guest-widget fetcher: polls the public surface with no credentials.
pub struct GuestFetcher(pub ApiClient);

#[async_trait]
impl SessionFetcher for GuestFetcher {
    async fn fetch(&self, session_id: &SessionId) -> Result<ChatSession, ClientError> {
        self.0.get_guest_session(session_id).await
    }
}

/// Render sink driven by the poll loop.
///
/// `render_new` receives exactly the suffix of messages not seen
/// before; the full log is never re-rendered.
pub trait ChatView: Send + 'static {
    /// The session changed (first snapshot or new session id): replace
    /// the local view with this snapshot.
    fn reset(&mut self, session: &ChatSession);

    /// Append newly observed messages.
    fn render_new(&mut self, messages: &[Message]);

    /// Toggle the non-blocking "connection issue" indicator.
    fn connection_issue(&mut self, degraded: bool);
}

/// Polling configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Tick interval.
    pub interval: Duration,

    /// Consecutive failures before the connection indicator shows.
    pub failure_threshold: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            failure_threshold: 3,
        }
    }
}

#[derive(Clone)]
struct PollControl {
    paused: bool,
    session_id: SessionId,
}

/// Handle to a running poll loop.
pub struct PollerHandle {
    control: watch::Sender<PollControl>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollerHandle {
    /// Suspend polling (chat panel closed/minimized).
    pub fn pause(&self) {
        self.control.send_modify(|c| c.paused = true);
    }

    /// Resume polling (chat panel reopened).
    pub fn resume(&self) {
        self.control.send_modify(|c| c.paused = false);
    }

    /// Switch to a different session (guest started a new
    /// conversation). The view is reset on the next snapshot.
    pub fn set_session(&self, session_id: SessionId) {
        self.control.send_modify(|c| c.session_id = session_id);
    }

    /// Tear the loop down. An in-flight fetch is allowed to complete;
    /// its result is discarded.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.join.await;
    }
}

/// The polling sync client. Spawns one loop per open chat UI; tabs
/// poll independently, no cross-tab coordination.
pub struct PollingSyncClient;

impl PollingSyncClient {
    /// Spawn the poll loop and return its handle.
    pub fn spawn(
        fetcher: Arc<dyn SessionFetcher>,
        view: impl ChatView,
        session_id: SessionId,
        config: PollConfig,
    ) -> PollerHandle {
        let (control, control_rx) = watch::channel(PollControl {
            paused: false,
            session_id,
        });
        let cancel = CancellationToken::new();
        let join = tokio::spawn(run_poll_loop(
            fetcher,
            Box::new(view),
            control_rx,
            cancel.clone(),
            config,
        ));
        PollerHandle {
            control,
            cancel,
            join,
        }
    }
}

async fn run_poll_loop(
    fetcher: Arc<dyn SessionFetcher>,
    mut view: Box<dyn ChatView>,
    control: watch::Receiver<PollControl>,
    cancel: CancellationToken,
    config: PollConfig,
) {
    let mut interval = tokio::time::interval(config.interval);
    // the fetch is awaited inline, so there is never more than one
    // request in flight; Skip keeps a slow response from causing a
    // burst of immediate ticks afterwards
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut known: Option<(SessionId, usize)> = None;
    let mut failures: u32 = 0;
    let mut degraded = false;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let ctl = control.borrow().clone();
        if ctl.paused {
            continue;
        }

        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            result = fetcher.fetch(&ctl.session_id) => result,
        };

        match fetched {
            Ok(snapshot) => {
                failures = 0;
                if degraded {
                    degraded = false;
                    view.connection_issue(false);
                }
                apply_snapshot(view.as_mut(), &mut known, &snapshot);
            }
            Err(e) => {
                failures += 1;
                warn!(
                    session_id = %ctl.session_id,
                    error = %e,
                    consecutive = failures,
                    "Poll failed, retrying next tick"
                );
                // transient failures wait out the threshold; a 4xx or
                // decode failure will not heal through retries, so the
                // indicator shows at once
                if (!e.is_transient() || failures >= config.failure_threshold) && !degraded {
                    degraded = true;
                    view.connection_issue(true);
                }
            }
        }
    }
    debug!("Poll loop stopped");
}

/// Diff a snapshot against the last-known state and drive the view.
fn apply_snapshot(
    view: &mut dyn ChatView,
    known: &mut Option<(SessionId, usize)>,
    snapshot: &ChatSession,
) {
    match known {
        Some((id, count)) if *id == snapshot.id => {
            if snapshot.messages.len() < *count {
                // late response from an older request
                debug!(session_id = %snapshot.id, "Discarding stale snapshot");
                return;
            }
            if snapshot.messages.len() > *count {
                view.render_new(&snapshot.messages[*count..]);
                *count = snapshot.messages.len();
            }
        }
        _ => {
            view.reset(snapshot);
            *known = Some((snapshot.id.clone(), snapshot.messages.len()));
        }
    }
}
