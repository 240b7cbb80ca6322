//! Error types for tally-parser

use thiserror::Error;

/// Rejection of a pasted table. Line numbers are 1-based positions in the
/// submitted text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedTableError {
    #[error("line {line}: table must have 4 columns, found {found}")]
    ColumnCount { line: usize, found: usize },

    #[error("line {line}: unrecognized date \"{value}\"")]
    InvalidDate { line: usize, value: String },

    #[error("line {line}: invalid amount \"{value}\"")]
    InvalidAmount { line: usize, value: String },
}

impl MalformedTableError {
    /// Line of the submitted text the error refers to
    pub fn line(&self) -> usize {
        match self {
            MalformedTableError::ColumnCount { line, .. }
            | MalformedTableError::InvalidDate { line, .. }
            | MalformedTableError::InvalidAmount { line, .. } => *line,
        }
    }
}

/// A single structural mismatch found while validating a decoded table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Location of the offending value, e.g. `[3].amount`
    pub path: String,
    /// What the schema requires at that location
    pub expected: &'static str,
    /// What was found instead
    pub received: String,
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() { "table" } else { self.path.as_str() };
        write!(f, "{}: expected {}, received {}", path, self.expected, self.received)
    }
}

/// Failure to serialize a table into its transport string
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("error encoding table: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to turn a transport string back into a table
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded table is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}", format_issues(.0))]
    Schema(Vec<SchemaIssue>),
}

impl DecodeError {
    /// Schema issues, empty for the other failure kinds
    pub fn issues(&self) -> &[SchemaIssue] {
        match self {
            DecodeError::Schema(issues) => issues,
            _ => &[],
        }
    }
}

fn format_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
