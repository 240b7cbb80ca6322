//! Report structures for API responses

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use tally_parser::TransactionRecord;

use crate::error::UnresolvablePlanError;
use crate::plans::{resolve_plan, Plan};
use crate::stats::{
    aggregate_usage_stats, forecast_stats, last_activity, place_stats, trend_stats, AggregateUsageStats, ForecastStats,
    PlaceStats, StatsOptions, TrendStats,
};

/// Full insight for one plan account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountReport {
    pub account: String,
    pub row_count: usize,
    /// Local day of the newest transaction; the plan year comes from it
    pub last_transaction: NaiveDate,
    pub plan: Plan,
    pub plan_days: i64,
    pub balance: Decimal,
    pub places: PlaceStats,
    pub usage: AggregateUsageStats,
    pub forecast: ForecastStats,
    pub trend: TrendStats,
}

/// Account left out of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsupportedAccount {
    pub account: String,
    pub reason: String,
}

/// Insight for every account of a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<FixedOffset>,
    pub row_count: usize,
    /// First account with a supported plan
    pub default_account: Option<String>,
    pub accounts: Vec<AccountReport>,
    pub unsupported: Vec<UnsupportedAccount>,
}

impl Report {
    pub fn account(&self, name: &str) -> Option<&AccountReport> {
        self.accounts.iter().find(|report| report.account == name)
    }
}

/// Newest local day among `records`, falling back to the day of `now`
pub fn last_transaction_date(records: &[TransactionRecord], now: &DateTime<FixedOffset>) -> NaiveDate {
    last_activity(records)
        .and_then(|r| r.local_date(&now.timezone()))
        .unwrap_or_else(|| now.date_naive())
}

/// Resolve the plan of one account and run every statistic over its rows
pub fn account_report(
    account: &str,
    records: &[TransactionRecord],
    options: &StatsOptions,
    now: &DateTime<FixedOffset>,
) -> Result<AccountReport, UnresolvablePlanError> {
    let last_transaction = last_transaction_date(records, now);
    let plan = resolve_plan(account, last_transaction)?;

    let usage = aggregate_usage_stats(records, options);
    let total_start_amount = usage.total_start_amount(&plan);
    let used = usage.non_imported_amount;

    let places = place_stats(records, options);
    let forecast = forecast_stats(records, &plan, total_start_amount, used, now);
    let trend = trend_stats(records, &plan, total_start_amount, used, now);

    Ok(AccountReport {
        account: account.to_string(),
        row_count: records.len(),
        last_transaction,
        plan_days: plan.duration_days(),
        balance: usage.balance(&plan),
        plan,
        places,
        usage,
        forecast,
        trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn eastern() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        eastern().with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn row(account: &str, place: &str, amount: Decimal, when: DateTime<FixedOffset>) -> TransactionRecord {
        TransactionRecord::new(account, when.timestamp_millis(), place, amount)
    }

    #[test]
    fn test_account_report() {
        let account = "Fall Flex 500";
        let rows = vec![
            row(account, "Port City Java", dec!(-4.5), at(2024, 10, 5, 9)),
            row(account, "PatronImport Location", dec!(100), at(2024, 8, 20, 9)),
            row(account, "Fountain Dining Hall", dec!(-12), at(2024, 9, 1, 18)),
        ];
        let report = account_report(account, &rows, &StatsOptions::default(), &at(2024, 10, 6, 12)).unwrap();

        assert_eq!(report.last_transaction, NaiveDate::from_ymd_opt(2024, 10, 5).unwrap());
        assert_eq!(report.plan.total_amount, dec!(500));
        assert_eq!(report.plan_days, 123);
        assert_eq!(report.balance, dec!(583.5));
        assert_eq!(report.forecast.balance, dec!(583.5));
        assert_eq!(report.usage.imported_amount, dec!(100));
        assert_eq!(report.places.top.name.as_deref(), Some("Fountain Dining Hall"));
        assert_eq!(report.trend.usage_over_time.len(), 123);
        assert_eq!(report.row_count, 3);
    }

    #[test]
    fn test_account_report_unsupported_plan() {
        let rows = vec![row("Guest Pass", "A", dec!(-1), at(2024, 10, 5, 9))];
        let err = account_report("Guest Pass", &rows, &StatsOptions::default(), &at(2024, 10, 6, 12)).unwrap_err();
        assert!(matches!(err, UnresolvablePlanError::MissingAmount { .. }));
    }

    #[test]
    fn test_last_transaction_date_uses_local_day() {
        // 23:30 eastern on Dec 31 is Jan 1 in UTC; the plan year must stay 2024
        let late = eastern().with_ymd_and_hms(2024, 12, 31, 23, 30, 0).unwrap();
        let rows = vec![row("Fall 2024 2024", "A", dec!(-1), late)];
        assert_eq!(
            last_transaction_date(&rows, &at(2025, 1, 2, 8)),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
        assert_eq!(last_transaction_date(&[], &at(2025, 1, 2, 8)), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }
}
