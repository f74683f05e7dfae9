//! The standalone session handshake.
//!
//! `expendash auth` creates a session, prints the scannable payload and
//! waits until the backend reports the session confirmed (or the timeout
//! ceiling passes). The confirmed credential is a cookie on this process's
//! HTTP client, so the command is mainly a way to verify that the handshake
//! works end to end; `show` and `query` run the same flow inline when a
//! fetch comes back 401/403.

use crate::api::{Backend, HttpBackend};
use crate::commands::Out;
use crate::session::{Poller, SessionEvent};
use crate::{Config, Result};
use anyhow::{bail, Context};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Handles the `expendash auth` command - runs the QR handshake to
/// confirmation.
pub async fn auth(config: &Config) -> Result<Out<()>> {
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(config.api_base_url())?);
    run_handshake(&backend, config.poll_interval(), config.auth_timeout()).await?;
    Ok(Out::new_message("Session confirmed."))
}

/// Creates a session, shows its payload and polls until it is confirmed.
/// Fails on timeout or when the session cannot be created; per-tick poll
/// failures are retried by the poller itself.
pub(crate) async fn run_handshake(
    backend: &Arc<dyn Backend>,
    poll_interval: Duration,
    auth_timeout: Duration,
) -> Result<()> {
    let session = backend
        .create_session()
        .await
        .context("Unable to create an authentication session")?;

    info!("Scan this code to sign in, then confirm it on your device:");
    println!("{}", session.qr_code);

    let (events, mut confirmations) = mpsc::unbounded_channel();
    let poller = Poller::spawn(
        Arc::clone(backend),
        session.session_id,
        poll_interval,
        auth_timeout,
        events,
    );
    let outcome = confirmations.recv().await;
    poller.cancel();
    match outcome {
        Some(SessionEvent::Confirmed) => Ok(()),
        Some(SessionEvent::TimedOut) => bail!(crate::session::TIMEOUT_MESSAGE),
        None => bail!("The confirmation poller stopped unexpectedly"),
    }
}
