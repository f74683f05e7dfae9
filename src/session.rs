//! The QR-code session handshake.
//!
//! Authentication is out-of-band: the backend mints a session and a QR
//! payload, the user confirms it from another trusted context, and we poll
//! the confirmation endpoint until it flips to `confirmed` or a hard timeout
//! elapses. The poll task is the only persistent background resource in the
//! program, so it is built to be cancelled: every cancellation path
//! (confirmation, timeout, teardown, drop) guarantees no request fires
//! afterwards.

use crate::api::{Backend, SessionStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

/// Shown when the handshake is abandoned; the user has to start over.
pub const TIMEOUT_MESSAGE: &str =
    "Authentication timed out. Start a new session to try again.";

/// A short-lived authentication handshake. Created on the transition into
/// the unauthenticated state and dropped on confirmation or timeout.
#[derive(Debug, Clone)]
pub struct AuthSession {
    session_id: String,
    credential_payload: String,
    created_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(session_id: impl Into<String>, credential_payload: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            credential_payload: credential_payload.into(),
            created_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The backend-provided payload to render as a scannable code.
    pub fn credential_payload(&self) -> &str {
        &self.credential_payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Where the dashboard is in the authentication cycle. Lives exactly as long
/// as the process; there is no persisted credential.
#[derive(Debug, Clone, Default)]
pub enum AuthState {
    #[default]
    Idle,
    /// A transaction fetch is in flight to find out whether we are signed in.
    Checking,
    Authenticated,
    /// The handshake is underway: the session's QR payload should be shown
    /// and the confirmation endpoint is being polled.
    Unauthenticated { session: AuthSession },
    /// Terminal: the handshake was abandoned. `message` is user-visible.
    TimedOut { message: String },
    /// Terminal: a non-auth failure. `message` is user-visible.
    Error { message: String },
}

impl AuthState {
    /// A stable lowercase name for banners and assertions.
    pub fn name(&self) -> &'static str {
        match self {
            AuthState::Idle => "idle",
            AuthState::Checking => "checking",
            AuthState::Authenticated => "authenticated",
            AuthState::Unauthenticated { .. } => "unauthenticated",
            AuthState::TimedOut { .. } => "timed_out",
            AuthState::Error { .. } => "error",
        }
    }

    /// Terminal states require a fresh start; nothing retries automatically.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthState::TimedOut { .. } | AuthState::Error { .. })
    }
}

/// What the poll task reports back to its owner.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SessionEvent {
    Confirmed,
    TimedOut,
}

/// A cancellable confirmation poller.
///
/// The task ticks at a fixed interval (the first request one interval after
/// spawn), checks the absolute timeout at the start of each tick, and treats
/// per-tick failures as transient: they are logged and polling continues.
/// Exactly one of `Confirmed`/`TimedOut` is sent, unless cancelled first.
pub struct Poller {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn spawn(
        backend: Arc<dyn Backend>,
        session_id: String,
        interval: Duration,
        timeout: Duration,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (cancel, mut cancelled) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let started = time::Instant::now();
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.changed() => {
                        debug!("session poll cancelled");
                        return;
                    }
                    _ = ticker.tick() => {
                        if *cancelled.borrow() {
                            return;
                        }
                        if started.elapsed() > timeout {
                            let _ = events.send(SessionEvent::TimedOut);
                            return;
                        }
                        match backend.poll_session(&session_id).await {
                            Ok(SessionStatus::Confirmed) => {
                                let _ = events.send(SessionEvent::Confirmed);
                                return;
                            }
                            Ok(SessionStatus::Pending) => {}
                            // Transient: keep polling until confirmation or
                            // the absolute timeout.
                            Err(e) => warn!("session poll failed, will retry: {e}"),
                        }
                    }
                }
            }
        });
        Self { cancel, handle }
    }

    /// Stops the task. No poll request fires after this returns.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestBackend;
    use tokio::time::advance;

    const INTERVAL: Duration = Duration::from_millis(2_000);
    const TIMEOUT: Duration = Duration::from_millis(300_000);

    /// Advances the paused clock one poll interval at a time so every tick
    /// fires (a single large jump would collapse delayed ticks into one).
    async fn advance_intervals(n: u32) {
        for _ in 0..n {
            advance(INTERVAL).await;
            tokio::task::yield_now().await;
        }
    }

    fn spawn_poller(
        backend: &Arc<TestBackend>,
    ) -> (Poller, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend: Arc<dyn Backend> = Arc::clone(backend) as Arc<dyn Backend>;
        let poller = Poller::spawn(backend, "session-1".to_string(), INTERVAL, TIMEOUT, tx);
        (poller, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_request_before_the_first_interval() {
        let backend = Arc::new(TestBackend::default());
        let (_poller, _rx) = spawn_poller(&backend);
        tokio::task::yield_now().await;
        advance(INTERVAL - Duration::from_millis(1)).await;
        assert_eq!(backend.poll_calls(), 0);
        advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(backend.poll_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_stops_polling_and_reports() {
        let backend = Arc::new(TestBackend::default());
        backend.plan_polls([Ok(SessionStatus::Pending), Ok(SessionStatus::Confirmed)]);
        let (_poller, mut rx) = spawn_poller(&backend);

        assert_eq!(rx.recv().await, Some(SessionEvent::Confirmed));
        assert_eq!(backend.poll_calls(), 2);

        // The task exited; more time produces no more requests.
        advance_intervals(5).await;
        assert_eq!(backend.poll_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_do_not_stop_polling() {
        let backend = Arc::new(TestBackend::default());
        backend.plan_polls([
            Err(crate::FetchError::Failed { status: 502 }),
            Ok(SessionStatus::Pending),
            Ok(SessionStatus::Confirmed),
        ]);
        let (_poller, mut rx) = spawn_poller(&backend);

        assert_eq!(rx.recv().await, Some(SessionEvent::Confirmed));
        assert_eq!(backend.poll_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_after_the_ceiling() {
        // Default plan answers pending forever.
        let backend = Arc::new(TestBackend::default());
        let (_poller, mut rx) = spawn_poller(&backend);

        assert_eq!(rx.recv().await, Some(SessionEvent::TimedOut));
        // Ticks land every 2s; the tick at 302s is the first with elapsed
        // strictly over the 300s ceiling, and it does not poll.
        assert_eq!(backend.poll_calls(), 150);

        advance_intervals(5).await;
        assert_eq!(backend.poll_calls(), 150);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_future_requests() {
        let backend = Arc::new(TestBackend::default());
        let (poller, mut rx) = spawn_poller(&backend);
        tokio::task::yield_now().await;

        advance_intervals(2).await;
        assert_eq!(backend.poll_calls(), 2);

        poller.cancel();
        advance_intervals(5).await;
        assert_eq!(backend.poll_calls(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let backend = Arc::new(TestBackend::default());
        let (poller, _rx) = spawn_poller(&backend);
        tokio::task::yield_now().await;

        advance(INTERVAL).await;
        tokio::task::yield_now().await;
        assert_eq!(backend.poll_calls(), 1);

        drop(poller);
        advance_intervals(5).await;
        assert_eq!(backend.poll_calls(), 1);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(AuthState::Idle.name(), "idle");
        assert_eq!(AuthState::Checking.name(), "checking");
        assert_eq!(
            AuthState::Unauthenticated {
                session: AuthSession::new("s", "payload")
            }
            .name(),
            "unauthenticated"
        );
        assert!(AuthState::TimedOut {
            message: TIMEOUT_MESSAGE.to_string()
        }
        .is_terminal());
        assert!(!AuthState::Checking.is_terminal());
    }
}
