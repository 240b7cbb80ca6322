//! JSON HTTP API for dining plan reports
//!
//! Routes are organized into modules:
//! - routes::tables: submit a pasted table, get its transport string
//! - routes::report: report for a transport string
//! - routes::settings: configuration display
//!
//! The transport string carries the whole table, so handlers share only
//! read-only state.

pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tally_config::Config;
use tally_core::Tally;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub tally: Arc<Tally>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            tally: Arc::new(Tally::new(&config)),
            config,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::report::api_report;
    use routes::settings::api_settings;
    use routes::tables::api_submit_table;

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/tables", post(api_submit_table))
        .route("/api/report", get(api_report))
        .route("/api/settings", get(api_settings))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Serve the API until interrupted
pub async fn start_server(config: Config) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(AppState::new(config));

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting Tally server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - GET  /api/health");
    log::info!("  - POST /api/tables (raw table body)");
    log::info!("  - GET  /api/report?data=<encoded>[&account=<name>][&now=<rfc3339>]");
    log::info!("  - GET  /api/settings");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    const TABLE: &str = "Account Name\tDate\tLocation\tAmount\n\
        Fall Flex 500\t2024-10-05 09:15:00\tPort City Java\t-$4.50\n\
        Guest Pass\t2024-10-04 12:00:00\tFountain Dining Hall\t-$9.00\n\
        Fall Flex 500\t2024-09-01 18:30:00\tFountain Dining Hall\t-$12.00\n";

    fn router() -> Router {
        let mut config = Config::default();
        config.report.utc_offset = Some("-05:00".to_string());
        create_router(AppState::new(config))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_table(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/tables")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn submit(router: Router) -> Value {
        let (status, body) = send(router, post_table(TABLE)).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    #[tokio::test]
    async fn test_health() {
        let response = router().oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_submit_table() {
        let body = submit(router()).await;
        let encoded = body["encoded"].as_str().unwrap();

        assert_eq!(body["row_count"], 3);
        assert_eq!(body["report_path"], format!("/report#{}", encoded));
        assert!(body["report_url"].as_str().unwrap().starts_with("/api/report?data="));
    }

    #[tokio::test]
    async fn test_submit_errors() {
        let (status, body) = send(router(), post_table("")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_INPUT");
        assert_eq!(body["message"], "must provide transaction history");

        let (status, body) = send(router(), post_table("Fall Flex 500\tyesterday\tA\t-$1.00")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_TABLE");
        assert_eq!(body["details"]["line"], 1);
    }

    #[tokio::test]
    async fn test_report() {
        let submitted = submit(router()).await;
        let uri = format!(
            "{}&now={}",
            submitted["report_url"].as_str().unwrap(),
            urlencoding::encode("2024-10-06T12:00:00-05:00")
        );
        let (status, body) = send(router(), get(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["row_count"], 3);
        assert_eq!(body["default_account"], "Fall Flex 500");
        assert_eq!(body["unsupported"][0]["account"], "Guest Pass");
        assert_eq!(body["accounts"][0]["places"]["top"]["name"], "Fountain Dining Hall");
        assert_eq!(body["accounts"][0]["forecast"]["remaining"]["status"], "days");
    }

    #[tokio::test]
    async fn test_report_accepts_unescaped_plus() {
        // Each '>' that ends a 3-byte group encodes to '+'
        let table = "Fall Flex 500\t2024-10-05 09:15:00\tSnack Bar >>>\t-$4.50\n";
        let (status, submitted) = send(router(), post_table(table)).await;
        assert_eq!(status, StatusCode::OK);
        let encoded = submitted["encoded"].as_str().unwrap();
        assert!(encoded.contains('+'));

        let uri = format!("/api/report?data={}&now=2024-10-06T12:00:00Z", encoded);
        let (status, body) = send(router(), get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["row_count"], 1);
        assert_eq!(body["accounts"][0]["places"]["top"]["name"], "Snack Bar >>>");
    }

    #[tokio::test]
    async fn test_report_account_errors() {
        let submitted = submit(router()).await;
        let url = submitted["report_url"].as_str().unwrap().to_string();

        let (status, body) = send(router(), get(&format!("{}&account=Guest%20Pass", url))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "UNSUPPORTED_PLAN");

        let (status, _) = send(router(), get(&format!("{}&account=Spring%2019%20300", url))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_report_bad_requests() {
        let (status, body) = send(router(), get("/api/report")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let (status, body) = send(router(), get("/api/report?data=%25%25%25")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "DECODE_ERROR");

        let (status, _) = send(router(), get("/api/report?data=W10%3D&now=tomorrow")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // "[]" decodes to a table without rows
        let (status, body) = send(router(), get("/api/report?data=W10%3D")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_TABLE");
    }

    #[tokio::test]
    async fn test_settings() {
        let (status, body) = send(router(), get("/api/settings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["utc_offset"], "-05:00");
        assert_eq!(body["report"]["import_place"], "PatronImport Location");
    }
}
