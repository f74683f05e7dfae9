//! The full dashboard cycle in a terminal: check, handshake if needed,
//! fetch, draw both charts, print the shareable link.

use crate::api::{Backend, HttpBackend};
use crate::args::ShowArgs;
use crate::chart::{ChartAdapter, TextSurface};
use crate::commands::Out;
use crate::dashboard::{Dashboard, DashboardEvent};
use crate::model::{accounts, aggregate, AggregateResult, DateRange, TransactionType};
use crate::session::AuthState;
use crate::{Config, Result};
use anyhow::bail;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// What `show` reports after the dashboard settles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ShowReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub income: AggregateResult,
    pub expense: AggregateResult,
    pub accounts: Vec<String>,
    pub link: String,
}

/// Handles the `expendash show` command - hosts one dashboard session.
pub async fn show(config: Config, args: ShowArgs) -> Result<Out<ShowReport>> {
    let today = Local::now().date_naive();
    let link = parse_link(args.link())?;
    let range = DateRange::resolve(args.from(), args.to(), link.as_ref(), today);

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(config.api_base_url())?);
    let charts = ChartAdapter::new(Box::new(TextSurface), config.slice_label_min_percent());
    let mut dash = Dashboard::new(backend, charts, config.dashboard_settings(), range);
    let mut events = dash.subscribe();

    dash.start();
    while !dash.is_settled() {
        dash.process_next().await;
        while let Ok(event) = events.try_recv() {
            announce(&event);
        }
    }
    dash.teardown();

    match dash.auth() {
        AuthState::Authenticated => {}
        AuthState::TimedOut { message } | AuthState::Error { message } => bail!(message.clone()),
        other => bail!("The dashboard stopped in an unexpected state '{}'", other.name()),
    }

    let transactions = dash.transactions();
    let report = ShowReport {
        start: range.start(),
        end: range.end(),
        income: aggregate(transactions, TransactionType::Income),
        expense: aggregate(transactions, TransactionType::Expense),
        accounts: accounts(transactions),
        link: dash.share_link(),
    };
    Ok(Out::new(
        format!(
            "Rendered {} transactions from {} to {}. Share link: {}",
            transactions.len(),
            report.start,
            report.end,
            report.link
        ),
        report,
    ))
}

/// Prints dashboard events as they happen so the user can follow the cycle.
fn announce(event: &DashboardEvent) {
    match event {
        DashboardEvent::AuthChanged(AuthState::Checking) => info!("Checking authentication..."),
        DashboardEvent::AuthChanged(AuthState::Unauthenticated { session }) => {
            info!("Scan this code to sign in, then confirm it on your device:");
            println!("{}", session.credential_payload());
        }
        DashboardEvent::AuthChanged(_) => {}
        DashboardEvent::Loading(true) => info!("Loading transactions..."),
        DashboardEvent::Loading(false) => {}
        DashboardEvent::LinkChanged(link) => info!("Share link: {link}"),
        DashboardEvent::ChartsRendered => {}
    }
}

fn parse_link(raw: Option<&str>) -> Result<Option<Url>> {
    match raw {
        Some(s) => match Url::parse(s) {
            Ok(url) => Ok(Some(url)),
            Err(e) => bail!("Invalid --link value '{s}': {e}"),
        },
        None => Ok(None),
    }
}
