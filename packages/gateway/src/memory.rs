//! In-memory document store.
//!
//! Backs tests and deployments with no configured remote (persistence is
//! then session-local, matching the "persistence skipped" degradation).
//! Also the only backing for the users/content collections, which have no
//! remote counterpart.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Document, DocumentStore, GatewayError};

struct Stored {
    /// Insertion sequence, so listings come back in insertion order.
    seq: u64,
    version: u64,
    value: Value,
}

/// A [`DocumentStore`] holding everything in process memory.
///
/// Methods panic only if the interior lock is poisoned.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Stored>>>,
    next_seq: std::sync::atomic::AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in a collection.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .expect("document store lock poisoned")
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Whether a collection holds no documents.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, value: Value) -> Result<Document, GatewayError> {
        let id = uuid::Uuid::new_v4().to_string();
        let seq = self
            .next_seq
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let mut guard = self
            .collections
            .write()
            .expect("document store lock poisoned");
        guard.entry(collection.to_string()).or_default().insert(
            id.clone(),
            Stored {
                seq,
                version: 1,
                value: value.clone(),
            },
        );
        Ok(Document {
            id,
            version: 1,
            value,
        })
    }

    async fn list(
        &self,
        collection: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Document>, GatewayError> {
        let guard = self
            .collections
            .read()
            .expect("document store lock poisoned");
        let mut entries: Vec<(&String, &Stored)> = guard
            .get(collection)
            .map(|coll| coll.iter().collect())
            .unwrap_or_default();
        entries.sort_by_key(|(_, stored)| stored.seq);

        let docs = entries
            .into_iter()
            .take(limit.map_or(usize::MAX, |n| n as usize))
            .map(|(id, stored)| Document {
                id: id.clone(),
                version: stored.version,
                value: stored.value.clone(),
            })
            .collect();
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, GatewayError> {
        let guard = self
            .collections
            .read()
            .expect("document store lock poisoned");
        Ok(guard.get(collection).and_then(|coll| {
            coll.get(id).map(|stored| Document {
                id: id.to_string(),
                version: stored.version,
                value: stored.value.clone(),
            })
        }))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        value: Value,
        expected_version: u64,
    ) -> Result<Document, GatewayError> {
        let mut guard = self
            .collections
            .write()
            .expect("document store lock poisoned");
        let stored = guard
            .get_mut(collection)
            .and_then(|coll| coll.get_mut(id))
            .ok_or_else(|| GatewayError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        if stored.version != expected_version {
            return Err(GatewayError::VersionConflict {
                collection: collection.to_string(),
                id: id.to_string(),
                expected: expected_version,
            });
        }

        stored.version += 1;
        stored.value = value.clone();
        Ok(Document {
            id: id.to_string(),
            version: stored.version,
            value,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), GatewayError> {
        let mut guard = self
            .collections
            .write()
            .expect("document store lock poisoned");
        if let Some(coll) = guard.get_mut(collection) {
            coll.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_id_and_version_one() {
        let store = MemoryStore::new();
        let doc = store
            .insert("markers", json!({"title": "a"}))
            .await
            .unwrap();
        assert!(!doc.id.is_empty());
        assert_eq!(doc.version, 1);
        assert_eq!(store.len("markers"), 1);
    }

    #[tokio::test]
    async fn update_bumps_version_when_expected_matches() {
        let store = MemoryStore::new();
        let doc = store.insert("markers", json!({"n": 1})).await.unwrap();

        let updated = store
            .update("markers", &doc.id, json!({"n": 2}), doc.version)
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.value["n"], 2);
    }

    #[tokio::test]
    async fn stale_update_is_rejected() {
        let store = MemoryStore::new();
        let doc = store.insert("markers", json!({"n": 1})).await.unwrap();

        // First writer wins; the second still holds version 1.
        store
            .update("markers", &doc.id, json!({"n": 2}), 1)
            .await
            .unwrap();
        let err = store
            .update("markers", &doc.id, json!({"n": 3}), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::VersionConflict { .. }));

        // The losing write did not land.
        let current = store.get("markers", &doc.id).await.unwrap().unwrap();
        assert_eq!(current.value["n"], 2);
    }

    #[tokio::test]
    async fn get_missing_is_none_and_delete_is_idempotent() {
        let store = MemoryStore::new();
        assert!(store.get("markers", "nope").await.unwrap().is_none());
        store.delete("markers", "nope").await.unwrap();

        let doc = store.insert("markers", json!({})).await.unwrap();
        store.delete("markers", &doc.id).await.unwrap();
        store.delete("markers", &doc.id).await.unwrap();
        assert!(store.is_empty("markers"));
    }

    #[tokio::test]
    async fn list_respects_fetch_cap() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert("content", json!({"i": i})).await.unwrap();
        }
        assert_eq!(store.list("content", Some(3)).await.unwrap().len(), 3);
        assert_eq!(store.list("content", None).await.unwrap().len(), 5);
    }
}
