use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One normalized journal or ledger line.
///
/// Identity is carried by `id`, not by field values: two rows with identical
/// contents but distinct source positions are distinct rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerRow {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub debit_amount: f64,
    #[serde(default)]
    pub credit_amount: f64,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub vendor_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entry_number: String,
    /// Original spreadsheet fields, carried untouched for export.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

impl LedgerRow {
    pub fn new(date: NaiveDate, debit_amount: f64, credit_amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            debit_amount,
            credit_amount,
            account_name: String::new(),
            vendor_name: String::new(),
            description: String::new(),
            entry_number: String::new(),
            fields: Map::new(),
        }
    }

    pub fn debit(date: NaiveDate, amount: f64) -> Self {
        Self::new(date, amount, 0.0)
    }

    pub fn credit(date: NaiveDate, amount: f64) -> Self {
        Self::new(date, 0.0, amount)
    }

    pub fn with_account(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = account_name.into();
        self
    }

    pub fn with_vendor(mut self, vendor_name: impl Into<String>) -> Self {
        self.vendor_name = vendor_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_entry_number(mut self, entry_number: impl Into<String>) -> Self {
        self.entry_number = entry_number.into();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Selected amount under `policy`, never negative.
    pub fn amount(&self, policy: AmountPolicy) -> f64 {
        policy.amount_of(self)
    }

    /// Whether the row carries a strictly positive amount under `policy`.
    pub fn is_eligible(&self, policy: AmountPolicy) -> bool {
        self.amount(policy) > 0.0
    }
}

/// Rule used to derive one non-negative amount from a row's debit and credit sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AmountPolicy {
    Debit,
    Credit,
    #[default]
    Both,
}

impl AmountPolicy {
    pub fn amount_of(self, row: &LedgerRow) -> f64 {
        let debit = sanitize(row.debit_amount);
        let credit = sanitize(row.credit_amount);
        match self {
            AmountPolicy::Debit => debit,
            AmountPolicy::Credit => credit,
            AmountPolicy::Both => debit + credit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AmountPolicy::Debit => "debit",
            AmountPolicy::Credit => "credit",
            AmountPolicy::Both => "both",
        }
    }
}

impl fmt::Display for AmountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AmountPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debit" | "debit-only" => Ok(AmountPolicy::Debit),
            "credit" | "credit-only" => Ok(AmountPolicy::Credit),
            "both" | "both-summed" => Ok(AmountPolicy::Both),
            other => Err(format!(
                "unknown amount type `{other}` (expected debit, credit or both)"
            )),
        }
    }
}

// Negative, NaN and infinite inputs never count as monetary value.
fn sanitize(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    #[test]
    fn policy_selects_expected_side() {
        let row = LedgerRow::new(date(), 120.0, 30.0);
        assert_eq!(row.amount(AmountPolicy::Debit), 120.0);
        assert_eq!(row.amount(AmountPolicy::Credit), 30.0);
        assert_eq!(row.amount(AmountPolicy::Both), 150.0);
    }

    #[test]
    fn negative_and_nan_amounts_are_ignored() {
        let row = LedgerRow::new(date(), -50.0, f64::NAN);
        assert_eq!(row.amount(AmountPolicy::Both), 0.0);
        assert!(!row.is_eligible(AmountPolicy::Debit));
    }

    #[test]
    fn identical_rows_keep_distinct_identity() {
        let first = LedgerRow::debit(date(), 10.0);
        let second = LedgerRow::debit(date(), 10.0);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn deserializes_without_id_or_fields() {
        let json = r#"{"date":"2024-01-05","debit_amount":15.5,"account_name":"Cash"}"#;
        let row: LedgerRow = serde_json::from_str(json).expect("row parses");
        assert_eq!(row.debit_amount, 15.5);
        assert_eq!(row.credit_amount, 0.0);
        assert!(row.fields.is_empty());
        assert!(!row.id.is_nil());
    }

    #[test]
    fn policy_parses_aliases() {
        assert_eq!("debit-only".parse::<AmountPolicy>(), Ok(AmountPolicy::Debit));
        assert_eq!("BOTH".parse::<AmountPolicy>(), Ok(AmountPolicy::Both));
        assert!("net".parse::<AmountPolicy>().is_err());
    }
}
