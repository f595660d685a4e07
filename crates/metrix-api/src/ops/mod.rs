//! Operational HTTP endpoints.
//!
//! - `/`        : banner
//! - `/healthz` : liveness
//! - `/readyz`  : readiness (503 when the store ping fails)
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;

pub async fn banner() -> impl IntoResponse {
    "Custom Metrics API is running!"
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(app): State<AppState>) -> impl IntoResponse {
    match app.store().ping().await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable")
        }
    }
}

pub async fn metrics(State(app): State<AppState>) -> Response {
    let stored = match app.store().list_all().await {
        Ok(all) => all.len() as u64,
        Err(e) => {
            tracing::warn!(error = %e, "could not count stored metrics");
            0
        }
    };
    let body = app.metrics().render(&[("metrix_metrics_stored", stored)]);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
