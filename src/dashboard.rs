//! The dashboard controller.
//!
//! One owned state object wires the pieces together: it holds the date
//! range, the current transaction list and the auth state, asks the backend
//! for data, and pushes aggregate results into the chart adapter. Nothing
//! reaches into shared state; renderers and hosts observe the controller
//! through the events it emits.
//!
//! Overlapping work is resolved with two rules. Fetches are latest-wins:
//! every fetch carries a sequence number and a completion is discarded
//! unless it is the newest one issued. The confirmation poller is
//! cancel-before-start: entering the auth flow cancels whatever poller came
//! before it.

use crate::api::Backend;
use crate::chart::{ChartAdapter, ChartSlot};
use crate::error::FetchError;
use crate::model::{aggregate, DateRange, Transaction, TransactionType};
use crate::session::{AuthSession, AuthState, Poller, SessionEvent, TIMEOUT_MESSAGE};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use url::Url;

/// Tunables and the share-link base, usually taken from `Config`.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub poll_interval: Duration,
    pub auth_timeout: Duration,
    pub share_url: Url,
}

/// State changes announced to whoever is hosting the dashboard (the CLI
/// loop, a test). The controller has already applied the change when the
/// event is emitted.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    AuthChanged(AuthState),
    Loading(bool),
    LinkChanged(String),
    ChartsRendered,
}

/// A completed transaction fetch, tagged with its sequence number.
struct FetchOutcome {
    seq: u64,
    outcome: Result<Vec<Transaction>, FetchError>,
}

pub struct Dashboard {
    backend: Arc<dyn Backend>,
    charts: ChartAdapter,
    settings: DashboardSettings,
    range: DateRange,
    transactions: Vec<Transaction>,
    auth: AuthState,
    loading: bool,
    fetch_seq: u64,
    poller: Option<Poller>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    session_tx: mpsc::UnboundedSender<SessionEvent>,
    session_rx: mpsc::UnboundedReceiver<SessionEvent>,
    events: Option<mpsc::UnboundedSender<DashboardEvent>>,
}

impl Dashboard {
    pub fn new(
        backend: Arc<dyn Backend>,
        charts: ChartAdapter,
        settings: DashboardSettings,
        range: DateRange,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            charts,
            settings,
            range,
            transactions: Vec::new(),
            auth: AuthState::Idle,
            loading: false,
            fetch_seq: 0,
            poller: None,
            fetch_tx,
            fetch_rx,
            session_tx,
            session_rx,
            events: None,
        }
    }

    /// Returns the event stream. Events emitted before the first call are
    /// dropped, so subscribe before `start`.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<DashboardEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Kicks off the first auth check and fetch for the initial range.
    pub fn start(&mut self) {
        self.emit(DashboardEvent::LinkChanged(self.share_link()));
        self.set_auth(AuthState::Checking);
        self.request_fetch();
    }

    pub fn set_start_date(&mut self, date: NaiveDate) {
        if date == self.range.start() {
            return;
        }
        self.range.set_start(date);
        self.range_changed();
    }

    pub fn set_end_date(&mut self, date: NaiveDate) {
        if date == self.range.end() {
            return;
        }
        self.range.set_end(date);
        self.range_changed();
    }

    /// Waits for the next completion (fetch or session event) and applies
    /// it. Hosts call this in a loop until `is_settled`.
    pub async fn process_next(&mut self) {
        tokio::select! {
            Some(outcome) = self.fetch_rx.recv() => self.on_fetch_done(outcome).await,
            Some(event) = self.session_rx.recv() => self.on_session_event(event),
            else => {}
        }
    }

    /// True when there is nothing left in flight: the dashboard is rendered
    /// or the cycle ended in a terminal state.
    pub fn is_settled(&self) -> bool {
        (matches!(self.auth, AuthState::Authenticated) && !self.loading)
            || self.auth.is_terminal()
    }

    /// Cancels the poller, if any. Dropping the dashboard does this too.
    pub fn teardown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn charts(&self) -> &ChartAdapter {
        &self.charts
    }

    /// The link that reproduces the current range.
    pub fn share_link(&self) -> String {
        let mut url = self.settings.share_url.clone();
        self.range.apply_to_url(&mut url);
        url.to_string()
    }

    fn range_changed(&mut self) {
        self.emit(DashboardEvent::LinkChanged(self.share_link()));
        self.request_fetch();
    }

    /// Issues a fetch for the current range. The sequence number lets
    /// `on_fetch_done` discard completions that a newer request superseded.
    fn request_fetch(&mut self) {
        self.fetch_seq += 1;
        let seq = self.fetch_seq;
        self.set_loading(true);
        let backend = Arc::clone(&self.backend);
        let range = self.range;
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let outcome = backend.fetch_transactions(&range).await;
            let _ = tx.send(FetchOutcome { seq, outcome });
        });
    }

    async fn on_fetch_done(&mut self, done: FetchOutcome) {
        if done.seq != self.fetch_seq {
            debug!(
                "discarding superseded fetch result (seq {} < {})",
                done.seq, self.fetch_seq
            );
            return;
        }
        self.set_loading(false);
        match done.outcome {
            Ok(transactions) => {
                debug!("fetched {} transactions", transactions.len());
                self.transactions = transactions;
                self.set_auth(AuthState::Authenticated);
                self.render_charts();
            }
            Err(e) if e.is_auth_required() => self.begin_auth_flow().await,
            Err(e) => {
                error!("transaction fetch failed: {e}");
                self.set_auth(AuthState::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Creates a session and starts polling for its confirmation. Any poller
    /// from an earlier cycle is cancelled first so only one timer is ever
    /// live.
    async fn begin_auth_flow(&mut self) {
        self.teardown();
        match self.backend.create_session().await {
            Ok(new_session) => {
                let session = AuthSession::new(new_session.session_id, new_session.qr_code);
                self.poller = Some(Poller::spawn(
                    Arc::clone(&self.backend),
                    session.session_id().to_string(),
                    self.settings.poll_interval,
                    self.settings.auth_timeout,
                    self.session_tx.clone(),
                ));
                self.set_auth(AuthState::Unauthenticated { session });
            }
            Err(e) => {
                error!("unable to create an authentication session: {e}");
                self.set_auth(AuthState::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        self.teardown();
        match event {
            SessionEvent::Confirmed => {
                info!("session confirmed, checking again");
                self.set_auth(AuthState::Checking);
                self.request_fetch();
            }
            SessionEvent::TimedOut => {
                self.set_auth(AuthState::TimedOut {
                    message: TIMEOUT_MESSAGE.to_string(),
                });
            }
        }
    }

    fn render_charts(&mut self) {
        let income = aggregate(&self.transactions, TransactionType::Income);
        let expense = aggregate(&self.transactions, TransactionType::Expense);
        self.charts.render(ChartSlot::Income, &income, "Income");
        self.charts.render(ChartSlot::Expense, &expense, "Expense");
        self.emit(DashboardEvent::ChartsRendered);
    }

    fn set_auth(&mut self, auth: AuthState) {
        debug!("auth state: {} -> {}", self.auth.name(), auth.name());
        self.auth = auth;
        self.emit(DashboardEvent::AuthChanged(self.auth.clone()));
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.emit(DashboardEvent::Loading(loading));
        }
    }

    fn emit(&self, event: DashboardEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
