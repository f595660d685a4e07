//! Static bearer-token gate for mutating routes.
//!
//! `Authorized` is an extractor: handlers that list it run only when the
//! request carries `Authorization: Bearer <configured token>` exactly.
//! Because it is resolved before the body extractor, a rejected request never
//! reaches the store.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use metrix_core::MetrixError;

use crate::{app_state::AppState, error::ApiError, obs::method_label};

/// Proof that the request passed the gate.
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

#[async_trait]
impl FromRequestParts<AppState> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts.headers.get(AUTHORIZATION).map(|v| v.as_bytes());
        if let Some(value) = presented {
            if constant_time_eq(value, state.expected_authorization()) {
                return Ok(Authorized);
            }
        }

        state
            .metrics()
            .auth_rejections
            .inc(&[("method", method_label(&parts.method))]);
        tracing::warn!(
            method = %parts.method,
            path = %parts.uri.path(),
            header_present = presented.is_some(),
            "rejected mutating request"
        );
        Err(ApiError(MetrixError::Unauthorized))
    }
}

/// Byte comparison whose running time depends only on the lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_only_identical_bytes() {
        assert!(constant_time_eq(b"Bearer abc", b"Bearer abc"));
        assert!(!constant_time_eq(b"Bearer abd", b"Bearer abc"));
        assert!(!constant_time_eq(b"Bearer ab", b"Bearer abc"));
        assert!(!constant_time_eq(b"bearer abc", b"Bearer abc"));
        assert!(constant_time_eq(b"", b""));
    }
}
