use crate::model::Amount;
use serde::{Deserialize, Deserializer, Serialize};

/// A single transaction as returned by the backend. Immutable once fetched;
/// the dashboard controller owns the list for the lifetime of the current
/// date-range query.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    /// Opaque identifier. The backend sends either a number or a string.
    #[serde(deserialize_with = "opaque_id")]
    id: String,
    account: String,
    category: String,
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: Amount,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        account: impl Into<String>,
        category: impl Into<String>,
        kind: TransactionType,
        amount: Amount,
    ) -> Self {
        Self {
            id: id.into(),
            account: account.into(),
            category: category.into(),
            kind,
            amount,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// Whether a transaction adds to or subtracts from the balance. Each chart
/// slot shows the breakdown for exactly one of these.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// Accepts the `id` field as either a JSON number or a string.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}
