//! Lightweight in-process request metrics.
//!
//! Series are stored as atomics and rendered in Prometheus text format by the
//! `/metrics` handler. `track` is the router-wide middleware that feeds them.

pub mod metrics;

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;

pub use metrics::ApiMetrics;

const STANDARD_METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "CONNECT", "TRACE",
];

/// Label value for a request method. Extension methods share one series.
pub fn method_label(method: &Method) -> &'static str {
    STANDARD_METHODS
        .into_iter()
        .find(|m| *m == method.as_str())
        .unwrap_or("other")
}

/// Count every request by method/route/status and record its latency.
pub async fn track(
    State(app): State<AppState>,
    matched: Option<MatchedPath>,
    req: Request,
    next: Next,
) -> Response {
    let method = method_label(req.method());
    let route = matched
        .as_ref()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched")
        .to_owned();
    let started = Instant::now();

    let resp = next.run(req).await;

    let status = resp.status();
    let m = app.metrics();
    m.http_requests.inc(&[
        ("method", method),
        ("route", route.as_str()),
        ("status", status.as_str()),
    ]);
    m.http_duration
        .observe(&[("method", method), ("route", route.as_str())], started.elapsed());
    resp
}
