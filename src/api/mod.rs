//! The backend HTTP surface consumed by the dashboard.
//!
//! `Backend` is the seam between the dashboard and the network: the
//! production implementation is `HttpBackend`, and tests substitute a
//! scripted double.

mod http;

pub use http::HttpBackend;

use crate::error::FetchError;
use crate::model::{DateRange, Transaction};
use serde::{Deserialize, Serialize};

/// A freshly created authentication session as returned by
/// `POST /create-session`. The QR payload is backend-provided; the client
/// never constructs it.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub session_id: String,
    pub qr_code: String,
}

/// The confirmation state of a session as reported by `GET /auth/{id}`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Confirmed,
}

serde_plain::derive_display_from_serialize!(SessionStatus);
serde_plain::derive_fromstr_from_deserialize!(SessionStatus);

/// The three backend calls the dashboard makes. All are suspension points;
/// failures propagate to the caller, which decides whether to branch into
/// the auth flow (see `FetchError::is_auth_required`).
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `POST /create-session`.
    async fn create_session(&self) -> Result<NewSession, FetchError>;

    /// `GET /auth/{session_id}`, credentials included.
    async fn poll_session(&self, session_id: &str) -> Result<SessionStatus, FetchError>;

    /// `GET /transactions?date_from=..&date_to=..`, credentials included.
    async fn fetch_transactions(&self, range: &DateRange) -> Result<Vec<Transaction>, FetchError>;
}
