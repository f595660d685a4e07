//! Axum router wiring.
//!
//! `GET /api/metrics` is open; POST/PUT/DELETE handlers take the
//! `Authorized` extractor and are rejected with 401 without a valid token.

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use crate::{app_state::AppState, handlers, obs, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ops::banner))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .route("/api/metrics", get(handlers::list).post(handlers::create))
        .route(
            "/api/metrics/:id",
            put(handlers::update).delete(handlers::remove),
        )
        .layer(middleware::from_fn_with_state(state.clone(), obs::track))
        .with_state(state)
}
