//! Fetches a range and prints the aggregates as text, without charts.

use crate::api::{Backend, HttpBackend};
use crate::args::QueryArgs;
use crate::commands::auth::run_handshake;
use crate::commands::Out;
use crate::model::{accounts, aggregate, AggregateResult, Amount, DateRange, TransactionType};
use crate::{Config, Result};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;

/// The structured result of `expendash query`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct QueryReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub income: Option<AggregateResult>,
    pub expense: Option<AggregateResult>,
    pub accounts: Vec<String>,
}

/// Handles the `expendash query` command. Runs the same
/// check-then-handshake-then-retry cycle as the dashboard, then prints the
/// requested aggregates.
pub async fn query(config: Config, args: QueryArgs) -> Result<Out<QueryReport>> {
    let today = Local::now().date_naive();
    let range = DateRange::resolve(args.from(), args.to(), None, today);

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(config.api_base_url())?);
    let transactions = match backend.fetch_transactions(&range).await {
        Ok(transactions) => transactions,
        Err(e) if e.is_auth_required() => {
            run_handshake(&backend, config.poll_interval(), config.auth_timeout()).await?;
            backend
                .fetch_transactions(&range)
                .await
                .context("The fetch failed again after the session was confirmed")?
        }
        Err(e) => return Err(e).context("Unable to fetch transactions"),
    };

    let wanted = args.transaction_type();
    let report = QueryReport {
        start: range.start(),
        end: range.end(),
        income: wanted
            .map_or(true, |t| t == TransactionType::Income)
            .then(|| aggregate(&transactions, TransactionType::Income)),
        expense: wanted
            .map_or(true, |t| t == TransactionType::Expense)
            .then(|| aggregate(&transactions, TransactionType::Expense)),
        accounts: accounts(&transactions),
    };
    let message = render_message(&report);
    Ok(Out::new(message, report))
}

fn render_message(report: &QueryReport) -> String {
    let mut message = format!("Transactions from {} to {}", report.start, report.end);
    if let Some(income) = &report.income {
        write_side(&mut message, "Income", income);
    }
    if let Some(expense) = &report.expense {
        write_side(&mut message, "Expense", expense);
    }
    if !report.accounts.is_empty() {
        let _ = write!(message, "\nAccounts: {}", report.accounts.join(", "));
    }
    message
}

fn write_side(message: &mut String, name: &str, result: &AggregateResult) {
    let _ = write!(message, "\n{name}: {}", Amount::new(result.total()));
    for (category, sum) in result.entries() {
        let _ = write!(message, "\n  {category}: {}", Amount::new(sum));
    }
}
