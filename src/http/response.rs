//! Rejection response returned to over-limit clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Message returned to clients that exceed the admission interval.
pub const REJECTION_MESSAGE: &str = "Too many requests. Please try again later.";

/// JSON body of the rejection response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable description of the rejection
    pub error: String,
}

/// Response emitted when a client is rejected.
///
/// Converts into `429 Too Many Requests` with a JSON body carrying a single
/// `error` field. The request pipeline halts here; no further handler runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TooManyRequests;

impl IntoResponse for TooManyRequests {
    fn into_response(self) -> Response {
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorBody {
                error: REJECTION_MESSAGE.to_string(),
            }),
        )
            .into_response()
    }
}
