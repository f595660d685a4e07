//! HTTP mapping for `MetrixError`.
//!
//! Every failure is rendered as `{"success": false, "message": ...}`.
//! Validation failures add a per-field `errors` map; store and config
//! failures are logged and reported without internal detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use metrix_core::MetrixError;

/// Newtype so axum's `IntoResponse` can be implemented here.
#[derive(Debug)]
pub struct ApiError(pub MetrixError);

impl From<MetrixError> for ApiError {
    fn from(e: MetrixError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            MetrixError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": "Validation error",
                    "errors": errors,
                }),
            ),
            MetrixError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": msg }),
            ),
            MetrixError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": "Metric not found" }),
            ),
            MetrixError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "success": false, "message": "Unauthorized" }),
            ),
            MetrixError::Store(_) | MetrixError::Config(_) => {
                tracing::error!(error = %self.0, code = self.0.client_code().as_str(), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": "Server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
