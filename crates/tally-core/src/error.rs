//! Error types for tally-core
//!
//! Every failure is local to one view: a rejected paste, an undecodable
//! report link, or an account whose plan cannot be inferred. Codes and
//! severities let the outer surfaces decide how to present them.

use thiserror::Error;
use serde::Serialize;
use tally_parser::{DecodeError, EncodeError, MalformedTableError};

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Nothing was submitted
    EmptyInput,
    /// Submitted table could not be parsed
    MalformedTable,
    /// Table could not be turned into a transport string
    EncodeError,
    /// Transport string could not be decoded
    DecodeError,
    /// Decoded table holds no rows
    EmptyTable,
    /// Account absent from the table
    AccountNotFound,
    /// Account name does not describe a known plan
    UnsupportedPlan,
    /// Request parameters are missing or invalid
    InvalidRequest,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::EmptyInput => write!(f, "EMPTY_INPUT"),
            ErrorCode::MalformedTable => write!(f, "MALFORMED_TABLE"),
            ErrorCode::EncodeError => write!(f, "ENCODE_ERROR"),
            ErrorCode::DecodeError => write!(f, "DECODE_ERROR"),
            ErrorCode::EmptyTable => write!(f, "EMPTY_TABLE"),
            ErrorCode::AccountNotFound => write!(f, "ACCOUNT_NOT_FOUND"),
            ErrorCode::UnsupportedPlan => write!(f, "UNSUPPORTED_PLAN"),
            ErrorCode::InvalidRequest => write!(f, "INVALID_REQUEST"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - the view can still render partially
    Warning,
    /// Error - the view cannot render
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Why an account name could not be turned into a plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnresolvablePlanError {
    #[error("no number found in plan name: {account}")]
    MissingAmount { account: String },

    #[error("plan amount {value} in \"{account}\" is out of range")]
    AmountOutOfRange { account: String, value: String },

    #[error("invalid term: \"{term}\" in plan name: {account}")]
    UnknownTerm { account: String, term: String },

    #[error("reference year {year} is out of range")]
    YearOutOfRange { year: i32 },
}

/// Main error type for tally-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("must provide transaction history")]
    EmptyInput,

    #[error("{0}")]
    MalformedTable(#[from] MalformedTableError),

    #[error("{0}")]
    Encode(#[from] EncodeError),

    #[error("error processing table: {0}")]
    Decode(#[from] DecodeError),

    #[error("found 0 rows in provided table")]
    EmptyTable,

    #[error("account not found: {name}")]
    AccountNotFound { name: String },

    #[error("unsupported plan: {0}")]
    UnsupportedPlan(#[from] UnresolvablePlanError),
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::EmptyInput => ErrorCode::EmptyInput,
            CoreError::MalformedTable(_) => ErrorCode::MalformedTable,
            CoreError::Encode(_) => ErrorCode::EncodeError,
            CoreError::Decode(_) => ErrorCode::DecodeError,
            CoreError::EmptyTable => ErrorCode::EmptyTable,
            CoreError::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            CoreError::UnsupportedPlan(_) => ErrorCode::UnsupportedPlan,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::EmptyInput => ErrorSeverity::Info,
            CoreError::MalformedTable(_) => ErrorSeverity::Error,
            CoreError::Encode(_) => ErrorSeverity::Error,
            CoreError::Decode(_) => ErrorSeverity::Error,
            CoreError::EmptyTable => ErrorSeverity::Info,
            CoreError::AccountNotFound { .. } => ErrorSeverity::Warning,
            CoreError::UnsupportedPlan(_) => ErrorSeverity::Warning,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::EmptyInput => {
                details = details.with_suggestion(
                    "Copy the transaction history table from the dining portal and paste it.".to_string(),
                );
            }
            CoreError::MalformedTable(e) => {
                details = details.with_detail(serde_json::json!({ "line": e.line() }));
                details = details.with_suggestion(
                    "Each row needs account, date, location and amount separated by tabs.".to_string(),
                );
            }
            CoreError::Decode(e) => {
                let issues: Vec<String> = e.issues().iter().map(|i| i.to_string()).collect();
                if !issues.is_empty() {
                    details = details.with_detail(serde_json::json!({ "issues": issues }));
                }
                details = details.with_suggestion(
                    "Generate a new report link from the original table.".to_string(),
                );
            }
            CoreError::UnsupportedPlan(_) => {
                details = details.with_suggestion(
                    "Plan names must start with Spring, Summer or Fall and contain the plan amount.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error logger trait
pub trait ErrorLogger {
    /// Log an error raised while serving `operation`
    fn log_error(&self, error: &CoreError, operation: &str);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, operation: &str) {
        match error.severity() {
            ErrorSeverity::Error => log::error!(
                target: "tally::error",
                "[{}] {} - Operation: {}",
                error.code(),
                error,
                operation
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "tally::error",
                "[{}] {} - Operation: {}",
                error.code(),
                error,
                operation
            ),
            ErrorSeverity::Info => log::info!(
                target: "tally::error",
                "[{}] {} - Operation: {}",
                error.code(),
                error,
                operation
            ),
        }
    }
}

// ==================== Tests ====================
