//! In-memory metric collection.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::error::{MetrixError, Result};
use crate::metric::{Metric, MetricDraft, MetricId};

use super::MetricStore;

/// A stored record plus its insertion sequence (tie-breaker for equal
/// `created_at`).
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) metric: Metric,
    seq: u64,
}

/// `id -> record` map. Every write touches one shard entry only.
#[derive(Debug)]
pub struct MemoryStore {
    docs: DashMap<MetricId, Entry>,
    seq: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Insert an already-stamped record (used when loading a document file).
    pub(crate) fn insert_loaded(&self, metric: Metric) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.docs.insert(metric.id, Entry { metric, seq });
    }

    pub(crate) fn snapshot(&self) -> Vec<Metric> {
        let mut entries: Vec<Entry> = self.docs.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| {
            b.metric
                .created_at
                .cmp(&a.metric.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        entries.into_iter().map(|e| e.metric).collect()
    }

    pub(crate) fn create_now(&self, draft: &MetricDraft) -> Result<Metric> {
        let fields = draft.validate()?;
        let metric = Metric::from_fields(MetricId::new(), Utc::now(), fields);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.docs.insert(
            metric.id,
            Entry {
                metric: metric.clone(),
                seq,
            },
        );
        Ok(metric)
    }

    /// Returns `(updated, previous)`.
    pub(crate) fn update_now(&self, id: MetricId, patch: MetricDraft) -> Result<(Metric, Metric)> {
        let mut entry = self
            .docs
            .get_mut(&id)
            .ok_or_else(|| MetrixError::NotFound(id.to_string()))?;
        let updated = entry.metric.merged(patch)?;
        let previous = std::mem::replace(&mut entry.metric, updated.clone());
        Ok((updated, previous))
    }

    pub(crate) fn remove_now(&self, id: MetricId) -> Result<Entry> {
        self.docs
            .remove(&id)
            .map(|(_, e)| e)
            .ok_or_else(|| MetrixError::NotFound(id.to_string()))
    }

    /// Undo helpers for engines that persist after mutating.
    pub(crate) fn forget(&self, id: MetricId) {
        self.docs.remove(&id);
    }

    pub(crate) fn put_back(&self, metric: Metric) {
        if let Some(mut e) = self.docs.get_mut(&metric.id) {
            e.metric = metric;
        }
    }

    pub(crate) fn restore(&self, entry: Entry) {
        self.docs.insert(entry.metric.id, entry);
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Metric>> {
        Ok(self.snapshot())
    }

    async fn create(&self, draft: MetricDraft) -> Result<Metric> {
        self.create_now(&draft)
    }

    async fn update(&self, id: MetricId, patch: MetricDraft) -> Result<Metric> {
        self.update_now(id, patch).map(|(updated, _)| updated)
    }

    async fn remove(&self, id: MetricId) -> Result<Metric> {
        self.remove_now(id).map(|e| e.metric)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    fn draft(name: &str, ty: &str, formula: &str) -> MetricDraft {
        MetricDraft {
            name: Some(name.into()),
            description: None,
            calculation_type: Some(ty.into()),
            formula: Some(formula.into()),
        }
    }

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let store = MemoryStore::new();
        let created = store.create(draft("Signups", "count", "COUNT(signups)")).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all, vec![created.clone()]);
        assert_eq!(created.name, "Signups");
        assert_eq!(created.formula, "COUNT(signups)");
        assert_eq!(created.description, "");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new();
        let a = store.create(draft("a", "count", "x")).await.unwrap();
        let b = store.create(draft("b", "time", "y")).await.unwrap();
        let c = store.create(draft("c", "percentage", "z")).await.unwrap();

        let ids: Vec<_> = store.list_all().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn invalid_create_stores_nothing() {
        let store = MemoryStore::new();
        let err = store.create(draft("", "ratio", "x")).await.unwrap_err();
        match err {
            MetrixError::Validation(v) => assert_eq!(v.paths(), vec!["calculationType", "name"]),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn update_merges_and_keeps_created_at() {
        let store = MemoryStore::new();
        let m = store.create(draft("Signups", "count", "COUNT(signups)")).await.unwrap();

        let patch = MetricDraft {
            description: Some("daily signups".into()),
            ..Default::default()
        };
        let u = store.update(m.id, patch).await.unwrap();
        assert_eq!(u.description, "daily signups");
        assert_eq!(u.created_at, m.created_at);
        assert_eq!(u.name, m.name);
        assert_eq!(store.list_all().await.unwrap(), vec![u]);
    }

    #[tokio::test]
    async fn invalid_update_leaves_record_untouched() {
        let store = MemoryStore::new();
        let m = store.create(draft("a", "count", "x")).await.unwrap();
        let patch = MetricDraft {
            formula: Some("".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update(m.id, patch).await,
            Err(MetrixError::Validation(_))
        ));
        assert_eq!(store.list_all().await.unwrap(), vec![m]);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found_regardless_of_payload() {
        let store = MemoryStore::new();
        for patch in [MetricDraft::default(), draft("", "bogus", "")] {
            let err = store.update(MetricId::new(), patch).await.unwrap_err();
            assert!(matches!(err, MetrixError::NotFound(_)));
        }
    }

    #[tokio::test]
    async fn second_remove_is_not_found() {
        let store = MemoryStore::new();
        let m = store.create(draft("a", "count", "x")).await.unwrap();
        assert_eq!(store.remove(m.id).await.unwrap(), m);
        assert!(matches!(store.remove(m.id).await, Err(MetrixError::NotFound(_))));
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
