//! Report endpoint

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use tally_core::Report;

use crate::{ApiError, AppState};

/// Build the report of the table carried in `data`.
///
/// Optional parameters: `account` to report a single account and `now`
/// (RFC 3339) to fix the reference instant.
pub async fn api_report(
    state: State<AppState>,
    params: Query<HashMap<String, String>>,
) -> Result<Json<Report>, ApiError> {
    let data = params
        .get("data")
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing data parameter"))?;
    // An unescaped '+' arrives as a space; base64 never contains spaces
    let encoded = data.replace(' ', "+");

    let now = match params.get("now") {
        Some(value) => parse_now(value)?,
        None => state.tally.now(),
    };
    let account = params.get("account").map(|a| a.as_str()).filter(|a| !a.is_empty());

    let report = state.tally.report(&encoded, account, &now)?;
    Ok(Json(report))
}

fn parse_now(value: &str) -> Result<DateTime<FixedOffset>, ApiError> {
    DateTime::parse_from_rfc3339(&value.trim().replace(' ', "+"))
        .map_err(|e| ApiError::bad_request(format!("invalid now parameter \"{}\": {}", value, e)))
}
