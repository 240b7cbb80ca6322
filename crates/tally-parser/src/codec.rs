//! Transport encoding for parsed tables
//!
//! A table travels between the submission and the report as JSON wrapped in
//! standard base64, typically as the fragment of the report URL. Decoding
//! validates every row against the record schema before handing it out.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::DateTime;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::str::FromStr;

use crate::error::{DecodeError, EncodeError, SchemaIssue};
use crate::types::{is_valid_amount, TransactionRecord, TransactionTable};

/// Serialize a table into its transport string
pub fn encode(table: &[TransactionRecord]) -> Result<String, EncodeError> {
    let json = serde_json::to_string(table)?;
    Ok(STANDARD.encode(json))
}

/// Decode a transport string, with or without the leading `#` of a URL fragment
pub fn decode(encoded: &str) -> Result<TransactionTable, DecodeError> {
    let encoded = encoded.trim();
    let encoded = encoded.strip_prefix('#').unwrap_or(encoded);

    let bytes = STANDARD.decode(encoded)?;
    let text = String::from_utf8(bytes)?;
    let value: Value = serde_json::from_str(&text)?;

    let table = validate_table(&value)?;
    log::debug!("Decoded table with {} rows", table.len());
    Ok(table)
}

/// Check the structure of a decoded JSON value and build the records.
///
/// All issues are collected so that the message names every offending field.
pub fn validate_table(value: &Value) -> Result<TransactionTable, DecodeError> {
    let rows = match value {
        Value::Array(rows) => rows,
        other => {
            return Err(DecodeError::Schema(vec![SchemaIssue {
                path: String::new(),
                expected: "array",
                received: kind_of(other).to_string(),
            }]))
        }
    };

    let mut table = Vec::with_capacity(rows.len());
    let mut issues = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match validate_row(index, row) {
            Ok(record) => table.push(record),
            Err(mut row_issues) => issues.append(&mut row_issues),
        }
    }

    if issues.is_empty() {
        Ok(table)
    } else {
        log::warn!("Rejected decoded table: {} schema issues", issues.len());
        Err(DecodeError::Schema(issues))
    }
}

fn validate_row(index: usize, row: &Value) -> Result<TransactionRecord, Vec<SchemaIssue>> {
    let fields = match row {
        Value::Object(fields) => fields,
        other => {
            return Err(vec![SchemaIssue {
                path: format!("[{}]", index),
                expected: "object",
                received: kind_of(other).to_string(),
            }])
        }
    };

    let mut issues = Vec::new();
    let account = string_field(index, fields, "account", &mut issues);
    let place = string_field(index, fields, "place", &mut issues);

    let when = number_field(index, fields, "when", &mut issues).and_then(|n| {
        let when = timestamp_millis(n);
        if when.is_none() {
            issues.push(SchemaIssue {
                path: format!("[{}].when", index),
                expected: "integer millisecond timestamp",
                received: n.to_string(),
            });
        }
        when
    });

    let amount = number_field(index, fields, "amount", &mut issues).and_then(|n| {
        let amount = decimal_from_number(n);
        if amount.is_none() {
            issues.push(SchemaIssue {
                path: format!("[{}].amount", index),
                expected: "amount below 1e13 with at most 15 significant digits",
                received: n.to_string(),
            });
        }
        amount
    });

    match (account, when, place, amount) {
        (Some(account), Some(when), Some(place), Some(amount)) if issues.is_empty() => {
            Ok(TransactionRecord { account, when, place, amount })
        }
        _ => Err(issues),
    }
}

fn string_field(index: usize, fields: &Map<String, Value>, name: &str, issues: &mut Vec<SchemaIssue>) -> Option<String> {
    match fields.get(name) {
        Some(Value::String(s)) => Some(s.clone()),
        other => {
            issues.push(SchemaIssue {
                path: format!("[{}].{}", index, name),
                expected: "string",
                received: other.map(kind_of).unwrap_or("undefined").to_string(),
            });
            None
        }
    }
}

fn number_field<'a>(
    index: usize,
    fields: &'a Map<String, Value>,
    name: &str,
    issues: &mut Vec<SchemaIssue>,
) -> Option<&'a Number> {
    match fields.get(name) {
        Some(Value::Number(n)) => Some(n),
        other => {
            issues.push(SchemaIssue {
                path: format!("[{}].{}", index, name),
                expected: "number",
                received: other.map(kind_of).unwrap_or("undefined").to_string(),
            });
            None
        }
    }
}

/// Integral millisecond timestamp within chrono's range
fn timestamp_millis(n: &Number) -> Option<i64> {
    let millis = match n.as_i64() {
        Some(v) => v,
        None => {
            let v = n.as_f64()?;
            if v.fract() != 0.0 || v < i64::MIN as f64 || v > i64::MAX as f64 {
                return None;
            }
            v as i64
        }
    };
    DateTime::from_timestamp_millis(millis).map(|_| millis)
}

fn decimal_from_number(n: &Number) -> Option<Decimal> {
    let amount = if let Some(v) = n.as_i64() {
        Decimal::from(v)
    } else if let Some(v) = n.as_u64() {
        Decimal::from(v)
    } else {
        let v = n.as_f64().filter(|v| v.is_finite())?;
        // f64's Display is the shortest round-trip form, so 12.34 stays 12.34
        Decimal::from_str(&v.to_string()).ok()?
    };
    Some(amount).filter(is_valid_amount)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ==================== Tests ====================
