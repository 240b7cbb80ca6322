//! Transaction history parser implementation
//!
//! Turns the table pasted from the dining portal into typed records and
//! moves those records through a compact transport string.

pub mod codec;
pub mod error;
pub mod parser;
pub mod types;

pub use codec::{decode, encode};
pub use error::{DecodeError, EncodeError, MalformedTableError, SchemaIssue};
pub use parser::{parse_amount, TableParser, HEADER_TOKEN};
pub use types::{is_valid_amount, TransactionRecord, TransactionTable, AMOUNT_LIMIT};

/// Path of the report view for an encoded table
pub fn report_path(encoded: &str) -> String {
    format!("/report#{}", encoded)
}
