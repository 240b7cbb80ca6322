//! Core dining plan processing and business logic

pub mod accounts;
pub mod error;
pub mod plans;
pub mod reports;
pub mod stats;
pub mod time;

use chrono::{DateTime, FixedOffset};
use tally_config::Config;
use tally_parser::{decode, encode, report_path, TableParser, TransactionRecord};

pub use accounts::{partition, AccountTables};
pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorCode, ErrorDetails, ErrorLogger, ErrorSeverity};
pub use error::UnresolvablePlanError;
pub use plans::{can_resolve_plan, resolve_plan, Plan, Term};
pub use reports::{account_report, AccountReport, Report, UnsupportedAccount};
pub use stats::{
    aggregate_usage_stats, forecast_stats, place_stats, round_to_hundredth, trend_stats, AggregateUsageStats,
    ForecastStats, PlaceStats, RemainingDays, StatsOptions, TopPlace, TrendPoint, TrendStats,
};

/// Result of submitting a pasted table
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Submission {
    pub row_count: usize,
    pub encoded: String,
    pub report_path: String,
}

/// Entry point tying parsing, transport and statistics together
pub struct Tally {
    parser: TableParser,
    options: StatsOptions,
    offset: FixedOffset,
    error_logger: Box<dyn ErrorLogger + Send + Sync>,
}

impl Tally {
    /// Create a service from the loaded configuration
    pub fn new(config: &Config) -> Self {
        let offset = config.utc_offset();
        Self {
            parser: TableParser::new(offset).with_date_formats(config.parser.date_formats.iter()),
            options: StatsOptions {
                import_place: config.report.import_place.clone(),
                drain_place_prefix: config.report.drain_place_prefix.clone(),
            },
            offset,
            error_logger: Box::new(DefaultErrorLogger),
        }
    }

    /// Replace the logger used for failed operations
    pub fn with_error_logger(mut self, logger: Box<dyn ErrorLogger + Send + Sync>) -> Self {
        self.error_logger = logger;
        self
    }

    /// Offset defining the local calendar
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn options(&self) -> &StatsOptions {
        &self.options
    }

    /// Current instant in the configured offset
    pub fn now(&self) -> DateTime<FixedOffset> {
        chrono::Utc::now().with_timezone(&self.offset)
    }

    /// Parse pasted text into records
    pub fn parse(&self, content: &str) -> CoreResult<Vec<TransactionRecord>> {
        if content.trim().is_empty() {
            return Err(self.logged(CoreError::EmptyInput, "parse"));
        }
        self.parser
            .parse(content)
            .map_err(|e| self.logged(CoreError::from(e), "parse"))
    }

    /// Parse pasted text and produce its transport string and report link
    pub fn submit(&self, content: &str) -> CoreResult<Submission> {
        let table = self.parse(content)?;
        let encoded = encode(&table).map_err(|e| self.logged(CoreError::from(e), "submit"))?;
        log::info!("Encoded {} rows for report", table.len());

        Ok(Submission {
            row_count: table.len(),
            report_path: report_path(&encoded),
            encoded,
        })
    }

    /// Decode a transport string and build the report.
    ///
    /// With `account` set, only that account is reported and a plan that
    /// cannot be resolved becomes an error instead of an unsupported entry.
    pub fn report(&self, encoded: &str, account: Option<&str>, now: &DateTime<FixedOffset>) -> CoreResult<Report> {
        let table = decode(encoded).map_err(|e| self.logged(CoreError::from(e), "report"))?;
        self.report_for_table(&table, account, now)
    }

    /// Build the report of an already decoded table.
    ///
    /// Amounts are expected to pass `is_valid_amount`, as parsed and decoded
    /// rows do.
    pub fn report_for_table(
        &self,
        table: &[TransactionRecord],
        account: Option<&str>,
        now: &DateTime<FixedOffset>,
    ) -> CoreResult<Report> {
        if table.is_empty() {
            return Err(self.logged(CoreError::EmptyTable, "report"));
        }

        let tables = partition(table);
        let mut accounts = Vec::new();
        let mut unsupported = Vec::new();

        if let Some(name) = account {
            let records = tables.get(name).ok_or_else(|| {
                self.logged(CoreError::AccountNotFound { name: name.to_string() }, "report")
            })?;
            let report = account_report(name, records, &self.options, now)
                .map_err(|e| self.logged(CoreError::from(e), "report"))?;
            accounts.push(report);
        } else {
            for (name, records) in tables.iter() {
                match account_report(name, records, &self.options, now) {
                    Ok(report) => accounts.push(report),
                    Err(e) => {
                        log::warn!("Skipping account {}: {}", name, e);
                        unsupported.push(UnsupportedAccount {
                            account: name.to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        log::debug!(
            "Built report for {} accounts ({} unsupported) from {} rows",
            accounts.len(),
            unsupported.len(),
            table.len()
        );

        Ok(Report {
            generated_at: *now,
            row_count: table.len(),
            default_account: accounts.first().map(|report| report.account.clone()),
            accounts,
            unsupported,
        })
    }

    fn logged(&self, error: CoreError, operation: &str) -> CoreError {
        self.error_logger.log_error(&error, operation);
        error
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    const TABLE: &str = "Account Name\tDate\tLocation\tAmount\n\
        Fall Flex 500\t2024-10-05 09:15:00\tPort City Java\t-$4.50\n\
        Guest Pass\t2024-10-04 12:00:00\tFountain Dining Hall\t-$9.00\n\
        Fall Flex 500\t2024-09-01 18:30:00\tFountain Dining Hall\t-$12.00\n\
        Fall Flex 500\t2024-08-20 09:00:00\tPatronImport Location\t$100.00\n";

    fn config() -> Config {
        let mut config = Config::default();
        config.report.utc_offset = Some("-05:00".to_string());
        config
    }

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600).unwrap().with_ymd_and_hms(2024, 10, 6, 12, 0, 0).unwrap()
    }

    #[derive(Clone, Default)]
    struct RecordingLogger(Arc<Mutex<Vec<(ErrorCode, String)>>>);

    impl ErrorLogger for RecordingLogger {
        fn log_error(&self, error: &CoreError, operation: &str) {
            self.0.lock().unwrap().push((error.code(), operation.to_string()));
        }
    }

    #[test]
    fn test_submit_produces_report_link() {
        let tally = Tally::new(&config());
        let submission = tally.submit(TABLE).unwrap();

        assert_eq!(submission.row_count, 4);
        assert_eq!(submission.report_path, format!("/report#{}", submission.encoded));
        assert_eq!(decode(&submission.encoded).unwrap().len(), 4);
    }

    #[test]
    fn test_submit_rejects_empty_input() {
        let tally = Tally::new(&config());
        let err = tally.submit("  \n\t\n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptyInput);
        assert_eq!(err.to_string(), "must provide transaction history");
    }

    #[test]
    fn test_submit_rejects_malformed_table() {
        let tally = Tally::new(&config());
        let err = tally.submit("Fall Flex 500\t2024-10-05\tPort City Java").unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedTable);
    }

    #[test]
    fn test_report_lists_unsupported_accounts() {
        let tally = Tally::new(&config());
        let encoded = tally.submit(TABLE).unwrap().encoded;
        let report = tally.report(&encoded, None, &now()).unwrap();

        assert_eq!(report.row_count, 4);
        assert_eq!(report.default_account.as_deref(), Some("Fall Flex 500"));
        assert_eq!(report.accounts.len(), 1);
        assert_eq!(report.unsupported.len(), 1);
        assert_eq!(report.unsupported[0].account, "Guest Pass");

        let flex = report.account("Fall Flex 500").unwrap();
        assert_eq!(flex.balance, dec!(583.5));
        assert_eq!(flex.row_count, 3);
    }

    #[test]
    fn test_report_for_single_account() {
        let tally = Tally::new(&config());
        let encoded = tally.submit(TABLE).unwrap().encoded;

        let report = tally.report(&encoded, Some("Fall Flex 500"), &now()).unwrap();
        assert_eq!(report.accounts.len(), 1);
        assert!(report.unsupported.is_empty());

        let err = tally.report(&encoded, Some("Guest Pass"), &now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedPlan);

        let err = tally.report(&encoded, Some("Spring 19 300"), &now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountNotFound);
    }

    #[test]
    fn test_report_errors() {
        let tally = Tally::new(&config());

        let err = tally.report(&encode(&[]).unwrap(), None, &now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptyTable);
        assert_eq!(err.to_string(), "found 0 rows in provided table");

        let err = tally.report("not base64!", None, &now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DecodeError);
        assert!(err.to_string().starts_with("error processing table: "));
    }

    #[test]
    fn test_report_rejects_amounts_beyond_limit() {
        let rows = vec![
            TransactionRecord::new("Fall Flex 500", 1_728_137_700_000, "PatronImport Location", dec!(50000000000000000000000000000)),
            TransactionRecord::new("Fall Flex 500", 1_728_137_700_000, "PatronImport Location", dec!(50000000000000000000000000000)),
        ];
        let tally = Tally::new(&config());

        let err = tally.report(&encode(&rows).unwrap(), None, &now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DecodeError);
        assert!(err.to_string().contains("[0].amount"));
    }

    #[test]
    fn test_report_at_largest_amounts() {
        let rows = vec![
            TransactionRecord::new("Fall Flex 500", 1_728_137_700_000, "PatronImport Location", dec!(9999999999999.99)),
            TransactionRecord::new("Fall Flex 500", 1_728_137_700_000, "PatronImport Location", dec!(9999999999999.99)),
            TransactionRecord::new("Fall Flex 500", 1_728_137_700_000, "Port City Java", dec!(-0.01)),
        ];
        let tally = Tally::new(&config());

        let report = tally.report(&encode(&rows).unwrap(), None, &now()).unwrap();
        let flex = report.account("Fall Flex 500").unwrap();
        assert_eq!(flex.usage.imported_amount, dec!(19999999999999.98));
        assert!(flex.forecast.remaining.has_balance());
    }

    #[test]
    fn test_failures_reach_error_logger() {
        let logger = RecordingLogger::default();
        let tally = Tally::new(&config()).with_error_logger(Box::new(logger.clone()));

        let _ = tally.submit("");
        let _ = tally.report(&encode(&[]).unwrap(), None, &now());

        let logged = logger.0.lock().unwrap();
        assert_eq!(
            *logged,
            vec![
                (ErrorCode::EmptyInput, "parse".to_string()),
                (ErrorCode::EmptyTable, "report".to_string())
            ]
        );
    }

    #[test]
    fn test_reserved_places_come_from_config() {
        let mut config = config();
        config.report.import_place = "Deposit".to_string();
        let tally = Tally::new(&config);
        assert_eq!(tally.options().import_place, "Deposit");
        assert_eq!(tally.offset(), FixedOffset::west_opt(5 * 3600).unwrap());
    }
}
