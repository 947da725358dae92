use std::sync::Arc;
use std::time::Duration;

use models::{ScanSession, ScanStatus, StatusEvent, Transition};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::ScanBackend;
use crate::error::{BackendError, Result, WorkflowError};
use crate::events::{AuthEvent, EventBus, Subscription};

/// Fixed polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Cosmetic progress lines, rotated on every non-terminal poll.
pub const PROGRESS_MESSAGES: &[&str] = &[
    "Starting URL analysis...",
    "Collecting website data...",
    "Checking vulnerability patterns...",
    "Analyzing security threats...",
];

const AUTH_REQUIRED_MESSAGE: &str = "authentication required: the session expired while polling";

/// What a running poller reports to its owner.
#[derive(Clone, Debug, PartialEq)]
pub enum PollUpdate {
    /// Still running. `message` carries no meaning beyond display.
    Progress { status: ScanStatus, message: &'static str },
    /// Reached `COMPLETED` or `FAILED`. Sent exactly once, last.
    Finished(ScanSession),
}

/// Drives a [`ScanSession`] to a terminal state by polling the backend.
///
/// One request is in flight at a time: the loop awaits each reply before
/// waiting for the next tick, and a slow reply delays the next tick instead
/// of bunching them.
#[derive(Clone)]
pub struct StatusPoller {
    backend: Arc<dyn ScanBackend>,
    events: EventBus,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(backend: Arc<dyn ScanBackend>, events: EventBus) -> Self {
        Self { backend, events, interval: DEFAULT_POLL_INTERVAL }
    }

    /// Override the cadence. Zero is bumped to one millisecond.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `session` on the current runtime.
    ///
    /// The first status check is issued immediately. Terminal or in-memory
    /// sessions are reported as finished without any network call.
    pub fn watch(&self, session: ScanSession, token: impl Into<String>) -> PollHandle {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();
        // Subscribe before spawning so an expiry published right away is seen.
        let auth = self.events.subscribe();
        let task = tokio::spawn(drive(self.clone(), session, token.into(), cancel.clone(), tx, auth));
        PollHandle { cancel, updates: rx, task: Some(task), finished: false }
    }
}

/// Owner's side of a running poller. Dropping it cancels the poller.
pub struct PollHandle {
    cancel: CancellationToken,
    updates: mpsc::UnboundedReceiver<PollUpdate>,
    task: Option<JoinHandle<ScanSession>>,
    finished: bool,
}

impl PollHandle {
    /// Stop polling. After this returns no update is delivered and the
    /// session is no longer mutated, even if a reply was already on its way.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether [`PollUpdate::Finished`] was handed out. A cancel arriving
    /// after that does not undo the outcome.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// A token that cancels this poller, e.g. from a signal handler.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next update, or `None` once finished or cancelled.
    pub async fn next(&mut self) -> Option<PollUpdate> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let update = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            update = self.updates.recv() => update.filter(|_| !self.cancel.is_cancelled()),
        };
        if matches!(update, Some(PollUpdate::Finished(_))) {
            self.finished = true;
        }
        update
    }

    /// Wait for the poller to stop and take back the session as it stands.
    pub async fn finish(mut self) -> Result<ScanSession> {
        let Some(task) = self.task.take() else {
            return Err(WorkflowError::PollerTask("poller already joined".into()));
        };
        task.await.map_err(|e| WorkflowError::PollerTask(e.to_string()))
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive(
    poller: StatusPoller,
    mut session: ScanSession,
    token: String,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<PollUpdate>,
    mut auth: Subscription,
) -> ScanSession {
    let deliver = |update: PollUpdate| {
        if !cancel.is_cancelled() {
            let _ = tx.send(update);
        }
    };

    if session.is_terminal() || !session.id().is_remote() {
        if !session.is_terminal() {
            session.apply(StatusEvent::Failed("an in-memory session cannot be polled".into()));
        }
        deliver(PollUpdate::Finished(session.clone()));
        return session;
    }

    let id = session.id().clone();
    let mut ticker = tokio::time::interval(poller.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls: usize = 0;

    info!(%id, interval_ms = poller.interval.as_millis() as u64, "status poller started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(AuthEvent::SessionExpired) = auth.recv() => {
                warn!(%id, "session expired elsewhere, halting poller");
                session.apply(StatusEvent::Failed(AUTH_REQUIRED_MESSAGE.into()));
            }
            _ = ticker.tick() => {
                let reply = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    reply = poller.backend.scan_status(&id, &token) => reply,
                };
                if cancel.is_cancelled() {
                    break;
                }
                polls += 1;
                debug!(%id, poll = polls, "status reply received");

                let event = match reply {
                    Ok(response) => response.into_event(),
                    Err(BackendError::Unauthorized) => {
                        warn!(%id, "status poll rejected: credentials expired");
                        poller.events.publish(AuthEvent::SessionExpired);
                        StatusEvent::Failed(AUTH_REQUIRED_MESSAGE.into())
                    }
                    Err(e) => {
                        warn!(%id, error = %e, "status poll failed");
                        StatusEvent::Failed(e.to_string())
                    }
                };

                if let Transition::Advanced { from, to } = session.apply(event) {
                    info!(%id, %from, %to, "scan status changed");
                }
            }
        }

        if session.is_terminal() {
            deliver(PollUpdate::Finished(session.clone()));
            return session;
        }

        let message = PROGRESS_MESSAGES[polls.saturating_sub(1) % PROGRESS_MESSAGES.len()];
        deliver(PollUpdate::Progress { status: session.status(), message });
    }

    info!(%id, status = %session.status(), "status poller cancelled");
    session
}
