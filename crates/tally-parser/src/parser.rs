//! Parser for the transaction history table pasted from the dining portal
//!
//! The portal renders a four column table (account, date, place, amount).
//! Copying it from the browser yields tab separated lines, optionally with
//! the header row.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use once_cell::sync::OnceCell;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::MalformedTableError;
use crate::types::{is_valid_amount, TransactionRecord, TransactionTable};

/// First cell of the header row
pub const HEADER_TOKEN: &str = "Account Name";

/// Number of tab separated columns on every row
pub const COLUMN_COUNT: usize = 4;

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%B %d, %Y %I:%M:%S %p",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M:%S %p",
    "%b %d, %Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"];

/// Line based parser for the pasted table
#[derive(Debug, Clone)]
pub struct TableParser {
    offset: FixedOffset,
    extra_formats: Vec<String>,
}

impl TableParser {
    /// Create a parser that reads wall-clock dates in `offset`
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            extra_formats: Vec::new(),
        }
    }

    /// Add chrono formats tried after the built-in ones
    pub fn with_date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_formats.extend(formats.into_iter().map(Into::into));
        self
    }

    /// Parse the pasted content into records, preserving line order.
    ///
    /// Blank lines and lines starting with the header token are skipped.
    /// Any other line must hold exactly four tab separated fields.
    pub fn parse(&self, content: &str) -> Result<TransactionTable, MalformedTableError> {
        let trimmed = content.trim();
        let leading = content.len() - content.trim_start().len();
        let first_line = content[..leading].matches('\n').count() + 1;

        let mut table = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with(HEADER_TOKEN) {
                continue;
            }
            table.push(self.parse_line(line, first_line + i)?);
        }

        log::debug!("Parsed {} transaction rows", table.len());
        Ok(table)
    }

    /// Parse a single data line
    pub fn parse_line(&self, line: &str, line_number: usize) -> Result<TransactionRecord, MalformedTableError> {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() != COLUMN_COUNT {
            return Err(MalformedTableError::ColumnCount {
                line: line_number,
                found: cols.len(),
            });
        }

        let when = self.parse_when(cols[1]).ok_or_else(|| MalformedTableError::InvalidDate {
            line: line_number,
            value: cols[1].trim().to_string(),
        })?;
        let amount = parse_amount(cols[3]).ok_or_else(|| MalformedTableError::InvalidAmount {
            line: line_number,
            value: cols[3].trim().to_string(),
        })?;

        Ok(TransactionRecord {
            account: cols[0].trim().to_string(),
            when,
            place: cols[2].trim().to_string(),
            amount,
        })
    }

    /// Parse a date cell into epoch milliseconds.
    ///
    /// Dates without an explicit offset are wall-clock times in the parser's
    /// offset; date-only values resolve to local midnight.
    pub fn parse_when(&self, value: &str) -> Option<i64> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.timestamp_millis());
        }

        let formats = DATETIME_FORMATS
            .iter()
            .copied()
            .chain(DATE_FORMATS.iter().copied())
            .chain(self.extra_formats.iter().map(String::as_str));

        for format in formats {
            if let Some(naive) = parse_naive(value, format) {
                return self
                    .offset
                    .from_local_datetime(&naive)
                    .single()
                    .map(|dt| dt.timestamp_millis());
            }
        }

        None
    }
}

fn parse_naive(value: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse a currency cell such as `-$12.34`, `- $1,024.00`, `+ $0.00`,
/// `$0.50` or `($3.10)`.
///
/// The accepted shape is an optional sign, an optional dollar symbol and a
/// plain decimal number with optional thousands separators. Parenthesised
/// values are negative. Anything else, including amounts that fail
/// [`is_valid_amount`], yields `None`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    static AMOUNT_PATTERN: OnceCell<Regex> = OnceCell::new();
    let amount_regex = AMOUNT_PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<sign>[+-])?\s*\$?\s*(?P<number>(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?|\.\d+)$").unwrap()
    });

    let raw = raw.trim();
    let (body, parenthesised) = match raw.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (inner.trim(), true),
        None => (raw, false),
    };

    let caps = amount_regex.captures(body)?;
    let sign = caps.name("sign").map(|m| m.as_str());
    if parenthesised && sign.is_some() {
        return None;
    }

    let number = caps.name("number")?.as_str().replace(',', "");
    let value = Decimal::from_str(&number).ok().filter(is_valid_amount)?;
    if value.is_zero() {
        return Some(Decimal::ZERO);
    }

    if parenthesised || sign == Some("-") {
        Some(-value)
    } else {
        Some(value)
    }
}

// ==================== Tests ====================
