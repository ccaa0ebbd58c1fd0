//! Expense record and ledger row models.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed category vocabulary the model is instructed to use.
///
/// "Other" is the fallback when the category is unclear.
pub const CATEGORIES: [&str; 8] = [
    "Food",
    "Transport",
    "Shopping",
    "Entertainment",
    "Utilities",
    "Health",
    "Travel",
    "Other",
];

/// A validated expense extracted from free text.
///
/// Invariant: `amount` came from a JSON number in the model response and
/// `vendor`/`category` are non-empty. Anything weaker is rejected during
/// structuring and never reaches this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Amount spent.
    pub amount: Decimal,

    /// Vendor or merchant name.
    pub vendor: String,

    /// Category, drawn from [`CATEGORIES`].
    pub category: String,
}

/// The persisted representation of one expense: a single spreadsheet row.
///
/// Append-only; there is no update or delete path.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    /// Date of processing (not the purchase date).
    pub date: NaiveDate,

    /// Amount spent.
    pub amount: Decimal,

    /// Vendor or merchant name.
    pub vendor: String,

    /// Expense category.
    pub category: String,
}

impl LedgerRow {
    /// Build a row for `record` dated with the given processing date.
    pub fn new(date: NaiveDate, record: &ExpenseRecord) -> Self {
        Self {
            date,
            amount: record.amount,
            vendor: record.vendor.clone(),
            category: record.category.clone(),
        }
    }

    /// Build a row for `record` dated today (UTC).
    pub fn for_today(record: &ExpenseRecord) -> Self {
        Self::new(Utc::now().date_naive(), record)
    }

    /// Serialize as the value list the spreadsheet append API expects:
    /// `[ISO date, amount, vendor, category]`.
    ///
    /// The amount goes out as a JSON number so the sheet's own
    /// currency formatting applies under `USER_ENTERED` input.
    pub fn to_values(&self) -> Vec<Value> {
        let amount = self
            .amount
            .to_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(self.amount.to_string()));

        vec![
            Value::String(self.date.to_string()),
            amount,
            Value::String(self.vendor.clone()),
            Value::String(self.category.clone()),
        ]
    }
}
