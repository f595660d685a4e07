//! Persistence accessor.
//!
//! `MetricStore` is the whole capability the API needs from a storage engine.
//! Engines are chosen by a connection string:
//! - `memory://`      : process-local collection (lost on exit)
//! - `file://<path>`  : JSON document file rewritten after every mutation
//!
//! No transactions and no optimistic locking: concurrent writers to the same
//! id race and the last write wins.

pub mod file;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{MetrixError, Result};
use crate::metric::{Metric, MetricDraft, MetricId};

pub use file::FileStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait MetricStore: Send + Sync {
    /// All records, newest `created_at` first.
    async fn list_all(&self) -> Result<Vec<Metric>>;

    /// Validate, assign id + created_at, store.
    async fn create(&self, draft: MetricDraft) -> Result<Metric>;

    /// Merge `patch` over the stored record and re-validate.
    async fn update(&self, id: MetricId, patch: MetricDraft) -> Result<Metric>;

    /// Delete and return the removed record.
    async fn remove(&self, id: MetricId) -> Result<Metric>;

    /// Cheap availability probe.
    async fn ping(&self) -> Result<()>;
}

/// Parsed store connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    Memory,
    File(PathBuf),
}

impl StoreUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (scheme, rest) = raw.split_once("://").ok_or_else(|| {
            MetrixError::Config(format!("invalid store url: {raw:?} (expected scheme://...)"))
        })?;
        match scheme {
            "memory" if rest.is_empty() => Ok(StoreUrl::Memory),
            "memory" => Err(MetrixError::Config(
                "memory:// store url takes no path".into(),
            )),
            "file" if !rest.is_empty() => Ok(StoreUrl::File(PathBuf::from(rest))),
            "file" => Err(MetrixError::Config("file:// store url requires a path".into())),
            other => Err(MetrixError::Config(format!("unsupported store scheme: {other}"))),
        }
    }
}

/// Open the engine named by `url`.
pub async fn open(url: &StoreUrl) -> Result<Arc<dyn MetricStore>> {
    match url {
        StoreUrl::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreUrl::File(path) => Ok(Arc::new(FileStore::open(path.clone()).await?)),
    }
}
