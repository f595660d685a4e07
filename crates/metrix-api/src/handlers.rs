//! `/api/metrics` request handlers.
//!
//! Each handler wraps one store operation and renders `{"success": true, ...}`
//! on success. Failures go through `ApiError`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use metrix_core::{MetricDraft, MetricId, MetrixError};

use crate::{app_state::AppState, auth::Authorized, error::ApiError};

type ApiResult<T> = std::result::Result<T, ApiError>;

/// A path segment that is not a well-formed id cannot name a stored record.
fn parse_id(raw: &str) -> ApiResult<MetricId> {
    MetricId::parse(raw).ok_or_else(|| ApiError(MetrixError::NotFound(raw.to_string())))
}

/// An empty body reads as `{}`: an empty patch on update, and a draft
/// missing every required field on create. Anything else must be JSON.
fn parse_draft(body: &Bytes) -> ApiResult<MetricDraft> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(MetricDraft::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError(MetrixError::BadRequest(format!("invalid JSON body: {e}"))))
}

pub async fn list(State(app): State<AppState>) -> ApiResult<Json<Value>> {
    let metrics = app.store().list_all().await?;
    Ok(Json(json!({ "success": true, "data": metrics })))
}

pub async fn create(
    State(app): State<AppState>,
    _auth: Authorized,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let draft = parse_draft(&body)?;
    let metric = app.store().create(draft).await?;
    tracing::info!(id = %metric.id, name = %metric.name, "metric created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": metric })),
    ))
}

pub async fn update(
    State(app): State<AppState>,
    _auth: Authorized,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    let patch = parse_draft(&body)?;
    let metric = app.store().update(id, patch).await?;
    tracing::info!(%id, "metric updated");
    Ok(Json(json!({ "success": true, "data": metric })))
}

pub async fn remove(
    State(app): State<AppState>,
    _auth: Authorized,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    app.store().remove(id).await?;
    tracing::info!(%id, "metric deleted");
    Ok(Json(json!({ "success": true, "message": "Deleted" })))
}
