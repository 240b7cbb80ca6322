//! Display formatting helpers

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Insert thousands separators into a run of digits
pub fn group_thousands(digits: &str) -> String {
    let mut grouped = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.chars().rev().collect()
}

/// Format an amount in dollars with cents and thousands separators: $1,234.56
pub fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let cents = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

    format!("{}${}.{}", sign, group_thousands(int_part), dec_part)
}

/// Daily rate, e.g. "$12.50 / day"
pub fn rate(amount: Decimal) -> String {
    format!("{} / day", money(amount))
}

/// Long date: October 5, 2024
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Short date for chart axes: Oct 5, 24
pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d, %y").to_string()
}
