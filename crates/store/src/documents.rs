//! Document persistence contract and in-memory backend.
//!
//! The core treats persistence as an opaque collection-of-documents service.
//! Failures are reduced to three cases the core can act on: `Conflict` (a
//! unique key already exists), `NotFound`, and `Unknown` (everything else).
//! Listing is always newest-first, which is the order every CareBook view
//! wants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Errors returned by the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A document with the same id or unique key already exists.
    #[error("conflict on {collection}: {detail}")]
    Conflict { collection: String, detail: String },

    /// No document matched the given id.
    #[error("not found in {collection}: {id}")]
    NotFound { collection: String, id: String },

    /// The backend failed in a way the core cannot recover from.
    #[error("store failure: {0}")]
    Unknown(String),
}

/// Type alias for Results that can fail with a [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// One stored document: its id, creation timestamp, and opaque fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub fields: Value,
}

/// A page of documents plus the total match count.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub total: u64,
}

/// Equality filters applied by [`DocumentStore::list`]. An empty query
/// matches the whole collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    equals: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the string field `name` to equal `value`.
    pub fn equal(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.push((name.into(), value.into()));
        self
    }

    fn matches(&self, fields: &Value) -> bool {
        self.equals
            .iter()
            .all(|(name, value)| fields.get(name).and_then(Value::as_str) == Some(value))
    }
}

/// The opaque persistence service.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document with the given id. Fails with
    /// [`StoreError::Conflict`] when the id, or a configured unique key, is
    /// already taken.
    async fn create(&self, collection: &str, id: &str, fields: Value) -> StoreResult<Document>;

    /// Replaces fields on an existing document, preserving any field the
    /// update does not mention.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> StoreResult<Document>;

    /// Fetches one document by id.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document>;

    /// Lists matching documents, newest first.
    async fn list(&self, collection: &str, query: &Query) -> StoreResult<DocumentPage>;
}

#[derive(Clone, Debug)]
struct StoredDoc {
    seq: u64,
    doc: Document,
}

#[derive(Default)]
struct Collections {
    docs: HashMap<String, Vec<StoredDoc>>,
    next_seq: u64,
}

/// In-memory [`DocumentStore`].
///
/// Collections are created on first write. Unique keys are configured up
/// front per collection (e.g. `email` on `users`) and enforced on create,
/// which is what lets the core exercise its conflict-recovery path.
pub struct MemoryStore {
    inner: RwLock<Collections>,
    unique_keys: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collections::default()),
            unique_keys: HashMap::new(),
        }
    }

    /// Declares `field` unique within `collection`.
    pub fn with_unique_key(mut self, collection: impl Into<String>, field: impl Into<String>) -> Self {
        self.unique_keys.insert(collection.into(), field.into());
        self
    }

    fn lock_poisoned() -> StoreError {
        StoreError::Unknown("store lock poisoned".to_owned())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, id: &str, fields: Value) -> StoreResult<Document> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_poisoned())?;

        let unique_key = self.unique_keys.get(collection).cloned();
        let docs = inner.docs.entry(collection.to_owned()).or_default();

        if docs.iter().any(|stored| stored.doc.id == id) {
            return Err(StoreError::Conflict {
                collection: collection.to_owned(),
                detail: format!("document id {id} already exists"),
            });
        }

        if let Some(key) = unique_key {
            let new_value = fields.get(&key).and_then(Value::as_str).map(str::to_owned);
            if let Some(new_value) = new_value {
                let taken = docs
                    .iter()
                    .any(|stored| stored.doc.fields.get(&key).and_then(Value::as_str) == Some(new_value.as_str()));
                if taken {
                    return Err(StoreError::Conflict {
                        collection: collection.to_owned(),
                        detail: format!("unique key {key} already taken"),
                    });
                }
            }
        }

        let doc = Document {
            id: id.to_owned(),
            created_at: Utc::now(),
            fields,
        };
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner
            .docs
            .get_mut(collection)
            .ok_or_else(|| StoreError::Unknown("collection vanished mid-write".to_owned()))?
            .push(StoredDoc { seq, doc: doc.clone() });

        tracing::debug!(collection, id, "document created");
        Ok(doc)
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> StoreResult<Document> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_poisoned())?;

        let docs = inner
            .docs
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })?;

        let stored = docs
            .iter_mut()
            .find(|stored| stored.doc.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })?;

        match (&mut stored.doc.fields, fields) {
            (Value::Object(existing), Value::Object(updates)) => {
                for (key, value) in updates {
                    existing.insert(key, value);
                }
            }
            (existing, replacement) => *existing = replacement,
        }

        tracing::debug!(collection, id, "document updated");
        Ok(stored.doc.clone())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let inner = self.inner.read().map_err(|_| Self::lock_poisoned())?;
        inner
            .docs
            .get(collection)
            .and_then(|docs| docs.iter().find(|stored| stored.doc.id == id))
            .map(|stored| stored.doc.clone())
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })
    }

    async fn list(&self, collection: &str, query: &Query) -> StoreResult<DocumentPage> {
        let inner = self.inner.read().map_err(|_| Self::lock_poisoned())?;
        let mut matches: Vec<&StoredDoc> = inner
            .docs
            .get(collection)
            .map(|docs| docs.iter().filter(|stored| query.matches(&stored.doc.fields)).collect())
            .unwrap_or_default();

        // created_at has second-level collisions in tests; seq breaks ties.
        matches.sort_by(|a, b| {
            (b.doc.created_at, b.seq).cmp(&(a.doc.created_at, a.seq))
        });

        let documents: Vec<Document> = matches.into_iter().map(|stored| stored.doc.clone()).collect();
        let total = documents.len() as u64;
        Ok(DocumentPage { documents, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryStore::new();
        store
            .create("appointments", "a1", json!({ "status": "pending" }))
            .await
            .expect("create");

        let doc = store.get("appointments", "a1").await.expect("get");
        assert_eq!(doc.fields["status"], "pending");
    }

    #[tokio::test]
    async fn duplicate_id_conflicts() {
        let store = MemoryStore::new();
        store.create("appointments", "a1", json!({})).await.expect("create");
        let err = store.create("appointments", "a1", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn unique_key_conflicts_across_documents() {
        let store = MemoryStore::new().with_unique_key("users", "email");
        store
            .create("users", "u1", json!({ "email": "pat@clinic.example" }))
            .await
            .expect("create");

        let err = store
            .create("users", "u2", json!({ "email": "pat@clinic.example" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_merges_fields_and_requires_existence() {
        let store = MemoryStore::new();
        store
            .create("appointments", "a1", json!({ "status": "pending", "reason": "checkup" }))
            .await
            .expect("create");

        let doc = store
            .update("appointments", "a1", json!({ "status": "scheduled" }))
            .await
            .expect("update");
        assert_eq!(doc.fields["status"], "scheduled");
        assert_eq!(doc.fields["reason"], "checkup");

        let err = store
            .update("appointments", "missing", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let store = MemoryStore::new();
        for (id, user) in [("a1", "u1"), ("a2", "u2"), ("a3", "u1")] {
            store
                .create("appointments", id, json!({ "user_id": user }))
                .await
                .expect("create");
        }

        let page = store
            .list("appointments", &Query::new().equal("user_id", "u1"))
            .await
            .expect("list");
        assert_eq!(page.total, 2);
        let ids: Vec<&str> = page.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a3", "a1"]);
    }

    #[tokio::test]
    async fn listing_an_absent_collection_is_empty_not_an_error() {
        let store = MemoryStore::new();
        let page = store.list("appointments", &Query::new()).await.expect("list");
        assert_eq!(page.total, 0);
        assert!(page.documents.is_empty());
    }
}
