//! Dining plan inference from account names
//!
//! The portal names accounts like `Fall 2024 2024` or `Spring Flex 300`: the
//! first word is the term and the first number is the funded amount. The
//! validity window depends only on the term and the year of a reference
//! date, normally the most recent transaction on the account.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::OnceCell;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::UnresolvablePlanError;
use crate::time::days_between;

/// Academic term a plan belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Term {
    Spring,
    Summer,
    Fall,
}

impl Term {
    /// Term named by the leading token of an account name
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Spring" => Some(Term::Spring),
            "Summer" => Some(Term::Summer),
            "Fall" => Some(Term::Fall),
            _ => None,
        }
    }

    /// Month and day of the first and last plan day
    fn bounds(&self) -> ((u32, u32), (u32, u32)) {
        match self {
            Term::Spring => ((1, 5), (5, 10)),
            Term::Summer => ((5, 11), (8, 9)),
            Term::Fall => ((8, 11), (12, 11)),
        }
    }

    /// Validity window of the term in `year`
    pub fn window(&self, year: i32) -> Option<(NaiveDate, NaiveDate)> {
        let ((start_month, start_day), (end_month, end_day)) = self.bounds();
        let start = NaiveDate::from_ymd_opt(year, start_month, start_day)?;
        let end = NaiveDate::from_ymd_opt(year, end_month, end_day)?;
        Some((start, end))
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Spring => write!(f, "Spring"),
            Term::Summer => write!(f, "Summer"),
            Term::Fall => write!(f, "Fall"),
        }
    }
}

/// Funded balance and validity window of a dining plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub term: Term,
    pub plan_start: NaiveDate,
    pub plan_end: NaiveDate,
    pub total_amount: Decimal,
}

impl Plan {
    /// Length of the plan in days, counting both ends
    pub fn duration_days(&self) -> i64 {
        days_between(self.plan_start, self.plan_end)
    }
}

/// First integer token in an account name, optionally signed.
///
/// When the name holds several numbers the first one wins, so
/// `Fall 2024 500` yields 2024.
fn plan_amount(account: &str) -> Result<Decimal, UnresolvablePlanError> {
    static NUMBER: OnceCell<Regex> = OnceCell::new();
    let number_regex = NUMBER.get_or_init(|| Regex::new(r"-?\d+").unwrap());

    let token = number_regex
        .find(account)
        .ok_or_else(|| UnresolvablePlanError::MissingAmount {
            account: account.to_string(),
        })?
        .as_str();

    token
        .parse::<i64>()
        .map(Decimal::from)
        .map_err(|_| UnresolvablePlanError::AmountOutOfRange {
            account: account.to_string(),
            value: token.to_string(),
        })
}

/// Infer the plan of `account` for the calendar year of `reference_date`
pub fn resolve_plan(account: &str, reference_date: NaiveDate) -> Result<Plan, UnresolvablePlanError> {
    let total_amount = plan_amount(account)?;

    let token = account.split(' ').next().unwrap_or_default();
    let term = Term::from_token(token).ok_or_else(|| UnresolvablePlanError::UnknownTerm {
        account: account.to_string(),
        term: token.to_string(),
    })?;

    let year = reference_date.year();
    let (plan_start, plan_end) = term
        .window(year)
        .ok_or(UnresolvablePlanError::YearOutOfRange { year })?;

    Ok(Plan {
        term,
        plan_start,
        plan_end,
        total_amount,
    })
}

/// Whether `resolve_plan` would succeed
pub fn can_resolve_plan(account: &str, reference_date: NaiveDate) -> bool {
    resolve_plan(account, reference_date).is_ok()
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_spring_window() {
        let plan = resolve_plan("Spring 19 300", date(2025, 2, 1)).unwrap();
        assert_eq!(plan.term, Term::Spring);
        assert_eq!(plan.plan_start, date(2025, 1, 5));
        assert_eq!(plan.plan_end, date(2025, 5, 10));
        assert_eq!(plan.total_amount, dec!(19));
    }

    #[test]
    fn test_summer_and_fall_windows() {
        let summer = resolve_plan("Summer Flex 250", date(2024, 6, 1)).unwrap();
        assert_eq!((summer.plan_start, summer.plan_end), (date(2024, 5, 11), date(2024, 8, 9)));

        let fall = resolve_plan("Fall Flex 500", date(2024, 12, 31)).unwrap();
        assert_eq!((fall.plan_start, fall.plan_end), (date(2024, 8, 11), date(2024, 12, 11)));
        assert_eq!(fall.duration_days(), 123);
    }

    #[test]
    fn test_first_number_wins() {
        let plan = resolve_plan("Fall 2024 500", date(2024, 9, 1)).unwrap();
        assert_eq!(plan.total_amount, dec!(2024));
    }

    #[test]
    fn test_negative_number_is_kept() {
        let plan = resolve_plan("Fall Plan-1 500", date(2024, 9, 1)).unwrap();
        assert_eq!(plan.total_amount, dec!(-1));
    }

    #[test]
    fn test_year_comes_from_reference_date() {
        let plan = resolve_plan("Fall 2024 2024", date(2023, 10, 1)).unwrap();
        assert_eq!(plan.plan_start, date(2023, 8, 11));
    }

    #[test]
    fn test_missing_amount() {
        let err = resolve_plan("Fall Flex", date(2024, 9, 1)).unwrap_err();
        assert_eq!(err, UnresolvablePlanError::MissingAmount { account: "Fall Flex".to_string() });
        assert!(!can_resolve_plan("Fall Flex", date(2024, 9, 1)));
    }

    #[test]
    fn test_unknown_term() {
        let err = resolve_plan("Winter 2024 500", date(2024, 9, 1)).unwrap_err();
        assert!(matches!(err, UnresolvablePlanError::UnknownTerm { ref term, .. } if term == "Winter"));

        // Terms are matched exactly, including case
        assert!(!can_resolve_plan("fall 2024 500", date(2024, 9, 1)));
        assert!(!can_resolve_plan(" Fall 2024 500", date(2024, 9, 1)));
    }

    #[test]
    fn test_amount_out_of_range() {
        let err = resolve_plan("Fall 99999999999999999999", date(2024, 9, 1)).unwrap_err();
        assert!(matches!(err, UnresolvablePlanError::AmountOutOfRange { .. }));
    }

    #[test]
    fn test_can_resolve_plan() {
        assert!(can_resolve_plan("Spring 19 300", date(2025, 2, 1)));
    }
}
