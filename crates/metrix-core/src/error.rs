//! Shared error type across metrix crates.

use thiserror::Error;

use crate::metric::ValidationErrors;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// One or more fields failed schema rules.
    Validation,
    /// Malformed request (e.g. unparsable body).
    BadRequest,
    /// Referenced record does not exist.
    NotFound,
    /// Missing or incorrect bearer token.
    Unauthorized,
    /// Persistence layer failure.
    Store,
    /// Invalid startup configuration.
    Config,
}

impl ClientCode {
    /// String representation used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::Validation => "VALIDATION",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Unauthorized => "UNAUTHORIZED",
            ClientCode::Store => "STORE",
            ClientCode::Config => "CONFIG",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetrixError>;

/// Unified error type used by core and api.
#[derive(Debug, Error)]
pub enum MetrixError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("metric not found: {0}")]
    NotFound(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("store: {0}")]
    Store(String),
    #[error("config: {0}")]
    Config(String),
}

impl MetrixError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            MetrixError::Validation(_) => ClientCode::Validation,
            MetrixError::BadRequest(_) => ClientCode::BadRequest,
            MetrixError::NotFound(_) => ClientCode::NotFound,
            MetrixError::Unauthorized => ClientCode::Unauthorized,
            MetrixError::Store(_) => ClientCode::Store,
            MetrixError::Config(_) => ClientCode::Config,
        }
    }
}

impl From<ValidationErrors> for MetrixError {
    fn from(e: ValidationErrors) -> Self {
        MetrixError::Validation(e)
    }
}
