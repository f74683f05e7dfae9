//! Turns a transaction list into the per-category sums that feed the charts.

use crate::model::{Transaction, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-category sums plus the grand total for one transaction type. Labels
/// and data are parallel sequences in first-seen category order. Derived
/// data: recomputed on every transaction or range change, never mutated in
/// place.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AggregateResult {
    labels: Vec<String>,
    data: Vec<Decimal>,
    total: Decimal,
}

impl AggregateResult {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn data(&self) -> &[Decimal] {
        &self.data
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates `(category, sum)` pairs in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.data.iter().copied())
    }
}

/// Sums the transactions of the requested type by category, keeping
/// categories in the order they first appear. Pure: two calls on the same
/// input produce identical results.
pub fn aggregate(transactions: &[Transaction], kind: TransactionType) -> AggregateResult {
    let mut labels: Vec<String> = Vec::new();
    let mut data: Vec<Decimal> = Vec::new();
    let mut total = Decimal::ZERO;

    for tx in transactions.iter().filter(|t| t.kind() == kind) {
        let amount = tx.amount().value();
        match labels.iter().position(|c| c == tx.category()) {
            Some(ix) => data[ix] += amount,
            None => {
                labels.push(tx.category().to_string());
                data.push(amount);
            }
        }
        total += amount;
    }

    AggregateResult { labels, data, total }
}

/// The distinct account names present in `transactions`, first-seen order.
pub fn accounts(transactions: &[Transaction]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for tx in transactions {
        if !names.iter().any(|n| n == tx.account()) {
            names.push(tx.account().to_string());
        }
    }
    names
}
