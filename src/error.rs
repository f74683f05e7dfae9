pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The ways a backend call can fail. The variants matter to callers: an
/// `AuthRequired` failure branches into the QR-session handshake, while every
/// other variant surfaces as a dashboard error state.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The backend answered 401 or 403: the caller must (re-)authenticate.
    #[error("authentication required (HTTP {status})")]
    AuthRequired { status: u16 },

    /// Any other non-success HTTP status.
    #[error("request failed (HTTP {status})")]
    Failed { status: u16 },

    /// The response body could not be parsed into the expected shape.
    #[error("malformed response body")]
    Parse(#[from] serde_json::Error),

    /// The request never produced an HTTP response.
    #[error("network error")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// True when the failure signals that the session handshake is needed.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, FetchError::AuthRequired { .. })
    }
}
