//! Settings endpoint

use axum::extract::State;
use axum::Json;
use tally_config::Config;

use crate::AppState;

/// Effective configuration
pub async fn api_settings(state: State<AppState>) -> Json<Config> {
    Json(state.config.clone())
}
