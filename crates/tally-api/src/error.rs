//! Error types for tally-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tally_core::{CoreError, ErrorCode, ErrorDetails};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    /// HTTP status for the error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Core(e) => match e.code() {
                ErrorCode::EmptyInput
                | ErrorCode::MalformedTable
                | ErrorCode::DecodeError
                | ErrorCode::EmptyTable
                | ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
                ErrorCode::AccountNotFound => StatusCode::NOT_FOUND,
                ErrorCode::UnsupportedPlan => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::EncodeError => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn details(&self) -> ErrorDetails {
        match self {
            ApiError::BadRequest { message } => ErrorDetails::new(ErrorCode::InvalidRequest, message.clone()),
            ApiError::Core(e) => e.to_details(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.details())).into_response()
    }
}
