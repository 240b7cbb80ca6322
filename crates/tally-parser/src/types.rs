//! Record types shared by the parser, the codec and the statistics engine

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// One row of the transaction history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    /// Plan account, e.g. "Fall 2024 2024"
    pub account: String,
    /// Epoch timestamp in milliseconds
    pub when: i64,
    /// Merchant or location
    pub place: String,
    /// Negative for spend, positive for funds added
    #[serde(serialize_with = "serialize_amount")]
    pub amount: Decimal,
}

/// Rows in paste order, usually newest first
pub type TransactionTable = Vec<TransactionRecord>;

/// Exclusive bound on the magnitude of a single amount
pub const AMOUNT_LIMIT: i64 = 10_000_000_000_000;

/// Significant digits an amount keeps through the JSON transport
pub const AMOUNT_SIGNIFICANT_DIGITS: u32 = 15;

/// Whether an amount is within range and survives the transport unchanged.
///
/// Amounts travel as JSON numbers (`f64`), which hold 15 significant digits
/// exactly. The magnitude bound keeps per-account sums and rates far from
/// `Decimal` overflow.
pub fn is_valid_amount(amount: &Decimal) -> bool {
    let normalized = amount.normalize();
    normalized.abs() < Decimal::from(AMOUNT_LIMIT)
        && normalized.mantissa().unsigned_abs() < 10u128.pow(AMOUNT_SIGNIFICANT_DIGITS)
}

impl TransactionRecord {
    pub fn new(account: impl Into<String>, when: i64, place: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account: account.into(),
            when,
            place: place.into(),
            amount,
        }
    }

    /// Instant of the transaction, `None` when outside the representable range
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.when)
    }

    /// Calendar day of the transaction in the given offset
    pub fn local_date(&self, offset: &FixedOffset) -> Option<NaiveDate> {
        self.timestamp()
            .map(|ts| ts.with_timezone(offset).date_naive())
    }
}

/// Amounts travel as plain JSON numbers
fn serialize_amount<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    match amount.to_f64() {
        Some(value) => serializer.serialize_f64(value),
        None => Err(serde::ser::Error::custom(format!("amount {} is not representable", amount))),
    }
}
