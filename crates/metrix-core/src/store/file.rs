//! JSON document file engine.
//!
//! The whole collection lives in memory and is rewritten to disk after each
//! successful mutation (`<path>.tmp` then rename, so readers never observe a
//! half-written file). Writers and `list_all` are serialized by `write_lock`;
//! if the rewrite fails the in-memory change is rolled back and a `Store`
//! error is returned.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{MetrixError, Result};
use crate::metric::{Metric, MetricDraft, MetricId};

use super::{MemoryStore, MetricStore};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    mem: MemoryStore,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Load `path` (a missing file is an empty collection). Every stored
    /// document is re-checked against the schema.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let mem = MemoryStore::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let mut docs: Vec<Metric> = serde_json::from_slice(&bytes).map_err(|e| {
                    MetrixError::Store(format!("parse {} failed: {e}", path.display()))
                })?;
                for m in &docs {
                    m.check().map_err(|e| {
                        MetrixError::Store(format!("invalid stored metric {}: {e}", m.id))
                    })?;
                }
                // File order is newest-first; insert oldest-first so insertion
                // sequence agrees with it on equal timestamps.
                docs.reverse();
                docs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                for m in docs {
                    mem.insert_loaded(m);
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "metric document not found, starting empty");
            }
            Err(e) => {
                return Err(MetrixError::Store(format!("read {} failed: {e}", path.display())));
            }
        }

        tracing::info!(path = %path.display(), count = mem.len(), "file store opened");
        Ok(Self {
            path,
            mem,
            write_lock: Mutex::new(()),
        })
    }

    /// Rewrite the document from the current in-memory state.
    /// Caller must hold `write_lock`.
    async fn flush(&self) -> Result<()> {
        let docs = self.mem.snapshot();
        let body = serde_json::to_vec_pretty(&docs)
            .map_err(|e| MetrixError::Store(format!("encode failed: {e}")))?;

        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| MetrixError::Store(format!("write {} failed: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            MetrixError::Store(format!("rename to {} failed: {e}", self.path.display()))
        })?;

        tracing::debug!(path = %self.path.display(), count = docs.len(), "metric document flushed");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

#[async_trait]
impl MetricStore for FileStore {
    /// Reads wait for an in-flight write so they never observe a change
    /// that is about to be rolled back.
    async fn list_all(&self) -> Result<Vec<Metric>> {
        let _guard = self.write_lock.lock().await;
        Ok(self.mem.snapshot())
    }

    async fn create(&self, draft: MetricDraft) -> Result<Metric> {
        let _guard = self.write_lock.lock().await;
        let created = self.mem.create_now(&draft)?;
        if let Err(e) = self.flush().await {
            tracing::warn!(id = %created.id, "create rolled back");
            self.mem.forget(created.id);
            return Err(e);
        }
        Ok(created)
    }

    async fn update(&self, id: MetricId, patch: MetricDraft) -> Result<Metric> {
        let _guard = self.write_lock.lock().await;
        let (updated, previous) = self.mem.update_now(id, patch)?;
        if let Err(e) = self.flush().await {
            tracing::warn!(%id, "update rolled back");
            self.mem.put_back(previous);
            return Err(e);
        }
        Ok(updated)
    }

    async fn remove(&self, id: MetricId) -> Result<Metric> {
        let _guard = self.write_lock.lock().await;
        let entry = self.mem.remove_now(id)?;
        if let Err(e) = self.flush().await {
            tracing::warn!(%id, "remove rolled back");
            self.mem.restore(entry);
            return Err(e);
        }
        Ok(entry.metric)
    }

    async fn ping(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let meta = tokio::fs::metadata(dir)
            .await
            .map_err(|e| MetrixError::Store(format!("stat {} failed: {e}", dir.display())))?;
        if !meta.is_dir() {
            return Err(MetrixError::Store(format!("{} is not a directory", dir.display())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use std::time::Duration;

    use super::*;

    fn draft(name: &str) -> MetricDraft {
        MetricDraft {
            name: Some(name.into()),
            description: Some("d".into()),
            calculation_type: Some("count".into()),
            formula: Some("COUNT(x)".into()),
        }
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("metrics.json")).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn records_survive_reopen_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");

        let store = FileStore::open(path.clone()).await.unwrap();
        let a = store.create(draft("a")).await.unwrap();
        let b = store.create(draft("b")).await.unwrap();
        let c = store.create(draft("c")).await.unwrap();
        store.remove(b.id).await.unwrap();
        let patch = MetricDraft {
            name: Some("a2".into()),
            ..Default::default()
        };
        let a = store.update(a.id, patch).await.unwrap();
        drop(store);

        let reopened = FileStore::open(path).await.unwrap();
        assert_eq!(reopened.list_all().await.unwrap(), vec![c, a]);
    }

    #[tokio::test]
    async fn invalid_document_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let doc = serde_json::json!([{
            "id": MetricId::new(),
            "name": "",
            "description": "",
            "calculationType": "count",
            "formula": "x",
            "createdAt": "2024-01-01T00:00:00Z"
        }]);
        std::fs::write(&path, doc.to_string()).unwrap();

        let err = FileStore::open(path).await.unwrap_err();
        assert_eq!(err.client_code().as_str(), "STORE");
    }

    #[tokio::test]
    async fn non_normalised_document_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let doc = serde_json::json!([{
            "id": MetricId::new(),
            "name": "  padded  ",
            "description": "d".repeat(300),
            "calculationType": "count",
            "formula": "x",
            "createdAt": "2024-01-01T00:00:00Z"
        }]);
        std::fs::write(&path, doc.to_string()).unwrap();

        let err = FileStore::open(path).await.unwrap_err();
        assert_eq!(err.client_code().as_str(), "STORE");
        assert!(err.to_string().contains("description"));
        assert!(err.to_string().contains("name"));
    }

    #[tokio::test]
    async fn list_waits_for_in_flight_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("metrics.json")).await.unwrap();
        let created = store.create(draft("a")).await.unwrap();

        let guard = store.write_lock.lock().await;
        let pending = tokio::time::timeout(Duration::from_millis(50), store.list_all()).await;
        assert!(pending.is_err());
        drop(guard);

        assert_eq!(store.list_all().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn failed_flush_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("metrics.json");
        let store = FileStore::open(path).await.unwrap();

        let err = store.create(draft("a")).await.unwrap_err();
        assert!(matches!(err, MetrixError::Store(_)));
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.ping().await.is_err());
    }
}
