//! Route modules for the API server
//!
//! - tables: table submission
//! - report: report for an encoded table
//! - settings: effective configuration

pub mod report;
pub mod settings;
pub mod tables;
