//! Error types for the slot bid server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Fetch Error ==
/// Failure while loading slot data from the analytical data store.
///
/// Every variant is treated as transient: the data source may simply be
/// unavailable right now, and the next request retries.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure or timeout talking to the data store
    #[error("data source request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The data store answered with a non-success status
    #[error("data source returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A row could not be decoded
    #[error("malformed data source response: {0}")]
    Decode(String),

    /// A query that must return a row returned none
    #[error("no data available: {0}")]
    Empty(String),
}

// == App Error ==
/// Unified error type for the server.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration, fatal at startup
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Slot data could not be fetched
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Fetch(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the server.
pub type Result<T> = std::result::Result<T, AppError>;
