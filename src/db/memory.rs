//! In-process document store.
//!
//! Backs the offline session and the test suite. Documents are kept as JSON
//! so reads go through the same serde path as Firestore reads, including the
//! injected `_firestore_id` field.

use crate::db::{array_patch, remove_from, union_into, AtomicUpdate, DocumentStore};
use crate::error::AppError;
use dashmap::{DashMap, DashSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct MemoryInner {
    collections: DashMap<String, BTreeMap<String, Value>>,
    failing: DashSet<String>,
    writes: AtomicUsize,
}

/// In-memory [`DocumentStore`]; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw JSON document, bypassing serialization.
    pub fn insert_raw(&self, collection: &str, id: &str, doc: Value) {
        self.inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
    }

    /// Raw JSON of a stored document (without the injected ID).
    pub fn raw(&self, collection: &str, id: &str) -> Option<Value> {
        self.inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
    }

    /// Make every read of `collection` fail until [`MemoryStore::restore`].
    pub fn fail_collection(&self, collection: &str) {
        self.inner.failing.insert(collection.to_string());
    }

    pub fn restore(&self, collection: &str) {
        self.inner.failing.remove(collection);
    }

    /// Number of write operations performed so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn check_readable(&self, collection: &str) -> Result<(), AppError> {
        if self.inner.failing.contains(collection) {
            return Err(AppError::Database(format!(
                "Injected read failure for {}",
                collection
            )));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn decode<T: DeserializeOwned>(id: &str, doc: &Value) -> Result<T, AppError> {
        let mut doc = doc.clone();
        if let Value::Object(map) = &mut doc {
            map.insert("_firestore_id".to_string(), Value::String(id.to_string()));
        }
        serde_json::from_value(doc)
            .map_err(|e| AppError::Database(format!("Failed to decode {}: {}", id, e)))
    }

    /// Read-modify-write under the collection's entry lock.
    fn apply_locked<F, R>(&self, collection: &str, id: &str, apply: F) -> Result<R, AppError>
    where
        F: FnOnce(Option<Value>) -> Result<AtomicUpdate<R>, AppError>,
    {
        let mut docs = self
            .inner
            .collections
            .entry(collection.to_string())
            .or_default();

        let current = docs.get(id).map(|doc| {
            let mut doc = doc.clone();
            if let Value::Object(map) = &mut doc {
                map.insert("_firestore_id".to_string(), Value::String(id.to_string()));
            }
            doc
        });
        let (patch, out) = apply(current)?;
        if patch.is_empty() {
            return Ok(out);
        }

        let doc = docs
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        let map = doc
            .as_object_mut()
            .ok_or_else(|| AppError::Database(format!("{}/{} is not an object", collection, id)))?;
        map.extend(patch);
        drop(docs);

        self.record_write();
        Ok(out)
    }

    fn mutate_array<F>(&self, collection: &str, id: &str, field: &str, mutate: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Vec<Value>),
    {
        self.apply_locked(collection, id, |doc| {
            Ok((array_patch(doc.as_ref(), collection, id, field, mutate)?, ()))
        })
    }
}

impl DocumentStore for MemoryStore {
    async fn get_document<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.check_readable(collection)?;
        let doc = self.raw(collection, id);
        doc.map(|doc| Self::decode(id, &doc)).transpose()
    }

    async fn list_documents<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.query_eq(collection, &[]).await
    }

    async fn query_eq<T>(&self, collection: &str, filters: &[(&str, &str)]) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.check_readable(collection)?;

        let matching: Vec<(String, Value)> = match self.inner.collections.get(collection) {
            Some(docs) => docs
                .iter()
                .filter(|(_, doc)| {
                    filters
                        .iter()
                        .all(|(field, value)| doc.get(*field).and_then(Value::as_str) == Some(*value))
                })
                .map(|(id, doc)| (id.clone(), doc.clone()))
                .collect(),
            None => Vec::new(),
        };

        matching
            .iter()
            .map(|(id, doc)| Self::decode(id, doc))
            .collect()
    }

    async fn set_document<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(doc).map_err(|e| AppError::Internal(e.into()))?;
        self.insert_raw(collection, id, value);
        self.record_write();
        Ok(())
    }

    async fn add_document<T>(&self, collection: &str, doc: &T) -> Result<String, AppError>
    where
        T: Serialize + Sync,
    {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.set_document(collection, &id, doc).await?;
        Ok(id)
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        patch: serde_json::Map<String, Value>,
    ) -> Result<(), AppError> {
        let mut docs = self
            .inner
            .collections
            .entry(collection.to_string())
            .or_default();
        let doc = docs
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        let map = doc
            .as_object_mut()
            .ok_or_else(|| AppError::Database(format!("{}/{} is not an object", collection, id)))?;
        map.extend(patch);
        drop(docs);

        self.record_write();
        Ok(())
    }

    async fn update_atomic<F, R>(&self, collection: &str, id: &str, apply: F) -> Result<R, AppError>
    where
        F: Fn(Option<Value>) -> Result<AtomicUpdate<R>, AppError> + Send + Sync + 'static,
        R: Send + 'static,
    {
        self.apply_locked(collection, id, apply)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), AppError> {
        if let Some(mut docs) = self.inner.collections.get_mut(collection) {
            docs.remove(id);
        }
        self.record_write();
        Ok(())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> Result<(), AppError> {
        self.mutate_array(collection, id, field, |array| union_into(array, values))
    }

    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> Result<(), AppError> {
        self.mutate_array(collection, id, field, |array| remove_from(array, values))
    }
}
