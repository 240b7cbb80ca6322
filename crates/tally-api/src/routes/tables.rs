//! Table submission endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::{ApiError, AppState};

/// Response of a successful submission
#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub row_count: usize,
    pub encoded: String,
    /// Fragment link to the report view
    pub report_path: String,
    /// JSON report endpoint for the same table
    pub report_url: String,
}

/// Parse a pasted table sent as the raw request body
pub async fn api_submit_table(state: State<AppState>, body: String) -> Result<Json<TablesResponse>, ApiError> {
    let submission = state.tally.submit(&body)?;
    let report_url = format!("/api/report?data={}", urlencoding::encode(&submission.encoded));

    Ok(Json(TablesResponse {
        row_count: submission.row_count,
        encoded: submission.encoded,
        report_path: submission.report_path,
        report_url,
    }))
}
