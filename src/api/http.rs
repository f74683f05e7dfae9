//! Implements the `Backend` trait against the real HTTP backend using
//! `reqwest`.

use crate::api::{Backend, NewSession, SessionStatus};
use crate::error::FetchError;
use crate::model::{DateRange, Transaction};
use anyhow::Context;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::trace;
use url::Url;

/// Talks to the backend over HTTP. The client carries a cookie store so that
/// the session cookie set during the handshake rides along on subsequent
/// calls, which is what the contract means by "credentials included".
pub struct HttpBackend {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    /// `base_url` must be the API root and must end with `/` so that
    /// endpoint paths can be appended directly (`Config` normalizes this).
    pub fn new(base_url: Url) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self { base_url, client })
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn create_session(&self) -> Result<NewSession, FetchError> {
        let url = format!("{}create-session", self.base_url);
        trace!("POST {url}");
        let response = self.client.post(&url).send().await?;
        read_json(response).await
    }

    async fn poll_session(&self, session_id: &str) -> Result<SessionStatus, FetchError> {
        let url = format!("{}auth/{session_id}", self.base_url);
        trace!("GET {url}");
        let response = self.client.get(&url).send().await?;
        let body: AuthStatusResponse = read_json(response).await?;
        Ok(body.status)
    }

    async fn fetch_transactions(&self, range: &DateRange) -> Result<Vec<Transaction>, FetchError> {
        let url = format!("{}transactions", self.base_url);
        trace!("GET {url} for {} to {}", range.start(), range.end());
        let response = self
            .client
            .get(&url)
            .query(&[
                ("date_from", range.start().to_string()),
                ("date_to", range.end().to_string()),
            ])
            .send()
            .await?;
        let body: TransactionsResponse = read_json(response).await?;
        Ok(body.transactions)
    }
}

/// Wire shape of `GET /auth/{session_id}`.
#[derive(Debug, Deserialize)]
struct AuthStatusResponse {
    status: SessionStatus,
}

/// Wire shape of `GET /transactions`.
#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<Transaction>,
}

/// Classifies the response status, then parses the body. 401/403 become
/// `AuthRequired` so the caller can branch into the session handshake.
async fn read_json<T>(response: Response) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status));
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

fn status_error(status: StatusCode) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::AuthRequired {
            status: status.as_u16(),
        },
        _ => FetchError::Failed {
            status: status.as_u16(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_401_and_403_require_auth() {
        assert!(status_error(StatusCode::UNAUTHORIZED).is_auth_required());
        assert!(status_error(StatusCode::FORBIDDEN).is_auth_required());
    }

    #[test]
    fn test_other_failures_do_not_require_auth() {
        for status in [
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
        ] {
            let err = status_error(status);
            assert!(!err.is_auth_required());
            assert!(matches!(err, FetchError::Failed { .. }));
        }
    }

    #[test]
    fn test_failed_carries_the_status_code() {
        match status_error(StatusCode::SERVICE_UNAVAILABLE) {
            FetchError::Failed { status } => assert_eq!(status, 503),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_session_response_parses() {
        let body = r#"{"session_id": "abc-123", "qr_code": "https://backend.example/scan/abc-123"}"#;
        let session: NewSession = serde_json::from_str(body).unwrap();
        assert_eq!(session.session_id, "abc-123");
        assert_eq!(session.qr_code, "https://backend.example/scan/abc-123");
    }

    #[test]
    fn test_auth_status_parses() {
        let pending: AuthStatusResponse = serde_json::from_str(r#"{"status": "pending"}"#).unwrap();
        assert_eq!(pending.status, SessionStatus::Pending);
        let confirmed: AuthStatusResponse =
            serde_json::from_str(r#"{"status": "confirmed"}"#).unwrap();
        assert_eq!(confirmed.status, SessionStatus::Confirmed);
    }

    #[test]
    fn test_transactions_response_parses() {
        let body = r#"{"transactions": [
            {"id": 1, "account": "Checking", "category": "salary", "type": "income", "amount": 1000},
            {"id": 2, "account": "Checking", "category": "food", "type": "expense", "amount": 300.5}
        ]}"#;
        let parsed: TransactionsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.transactions[0].category(), "salary");
    }

    #[test]
    fn test_malformed_body_is_a_parse_error() {
        let err = serde_json::from_str::<TransactionsResponse>("{\"transactions\": 5}")
            .map_err(FetchError::from)
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
