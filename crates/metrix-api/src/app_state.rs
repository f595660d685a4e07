//! Shared application state.
//!
//! Holds the store handle, the precomputed `Authorization` header value, and
//! the request metrics registry.

use std::sync::Arc;

use metrix_core::error::Result;
use metrix_core::store::{self, MetricStore};

use crate::config::AppConfig;
use crate::obs::ApiMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn MetricStore>,
    expected_authorization: Vec<u8>,
    metrics: ApiMetrics,
}

impl AppState {
    /// Open the store named by the config and build state around it.
    pub async fn from_config(cfg: AppConfig) -> Result<Self> {
        let url = cfg.store_url()?;
        let store = store::open(&url).await?;
        tracing::info!(store = ?url, "metric store ready");
        Ok(Self::new(cfg, store))
    }

    pub fn new(cfg: AppConfig, store: Arc<dyn MetricStore>) -> Self {
        let expected_authorization = format!("Bearer {}", cfg.auth.token).into_bytes();
        Self {
            inner: Arc::new(AppStateInner {
                store,
                expected_authorization,
                metrics: ApiMetrics::default(),
            }),
        }
    }

    pub fn store(&self) -> &dyn MetricStore {
        self.inner.store.as_ref()
    }

    pub fn expected_authorization(&self) -> &[u8] {
        &self.inner.expected_authorization
    }

    pub fn metrics(&self) -> &ApiMetrics {
        &self.inner.metrics
    }
}
