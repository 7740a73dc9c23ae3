//! Database layer (remote document store).
//!
//! Everything above this module talks to a [`DocumentStore`]. Production
//! uses [`FirestoreDb`]; tests and offline runs use [`MemoryStore`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const MEETUPS: &str = "meetups";
}

/// Field names touched by partial updates.
pub mod fields {
    pub const LOCATION: &str = "location";
    pub const ATTENDEES: &str = "attendees";
    pub const MEMBERS: &str = "members";
    pub const MYMEETS: &str = "mymeets";
    pub const JOINEDMEETS: &str = "joinedmeets";
}

/// Fields to write and the value handed back by an atomic update.
pub type AtomicUpdate<R> = (serde_json::Map<String, serde_json::Value>, R);

/// Document store operations used by the map and meetup flows.
///
/// Documents are read back with their ID in the `_firestore_id` field.
/// No operation spans more than one document; multi-document flows are
/// sequences of independent calls.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Fetch one document, `None` if absent.
    fn get_document<T>(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<T>, AppError>> + Send
    where
        T: DeserializeOwned + Send + 'static;

    /// Fetch every document of a collection.
    fn list_documents<T>(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<T>, AppError>> + Send
    where
        T: DeserializeOwned + Send + 'static;

    /// Fetch documents whose string fields equal all given values.
    fn query_eq<T>(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
    ) -> impl Future<Output = Result<Vec<T>, AppError>> + Send
    where
        T: DeserializeOwned + Send + 'static;

    /// Create or fully replace a document.
    fn set_document<T>(
        &self,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> impl Future<Output = Result<(), AppError>> + Send
    where
        T: Serialize + Sync;

    /// Create a document under a generated ID and return the ID.
    fn add_document<T>(
        &self,
        collection: &str,
        doc: &T,
    ) -> impl Future<Output = Result<String, AppError>> + Send
    where
        T: Serialize + Sync;

    /// Merge the top-level keys of `patch` into a document, creating it
    /// when absent.
    fn update_fields(
        &self,
        collection: &str,
        id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Read a document and write the fields `apply` derives from it, with
    /// no other write to the document landing in between.
    ///
    /// `apply` sees `None` for a missing document and may run more than once
    /// under contention. An `Err` from `apply` aborts without writing; an
    /// empty field map commits nothing.
    fn update_atomic<F, R>(
        &self,
        collection: &str,
        id: &str,
        apply: F,
    ) -> impl Future<Output = Result<R, AppError>> + Send
    where
        F: Fn(Option<serde_json::Value>) -> Result<AtomicUpdate<R>, AppError>
            + Send
            + Sync
            + 'static,
        R: Send + 'static;

    fn delete_document(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Append the values missing from a string-array field.
    fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Remove every occurrence of the values from a string-array field.
    fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// List a collection, decoding documents one by one so a single bad
/// document only drops itself.
pub async fn list_decoded<S, T>(store: &S, collection: &str) -> Result<Vec<T>, AppError>
where
    S: DocumentStore,
    T: DeserializeOwned,
{
    let docs = store
        .list_documents::<serde_json::Value>(collection)
        .await?;

    Ok(docs
        .into_iter()
        .filter_map(|doc| {
            let id = doc
                .get("_firestore_id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            match serde_json::from_value::<T>(doc) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(collection, id = %id, error = %e, "Skipping undecodable document");
                    None
                }
            }
        })
        .collect())
}

/// Derive the single-field patch for an array mutation of `doc`.
pub(crate) fn array_patch<F>(
    doc: Option<&serde_json::Value>,
    collection: &str,
    id: &str,
    field: &str,
    mutate: F,
) -> Result<serde_json::Map<String, serde_json::Value>, AppError>
where
    F: FnOnce(&mut Vec<serde_json::Value>),
{
    let mut array = match doc.and_then(|doc| doc.get(field)) {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(values)) => values.clone(),
        Some(_) => {
            return Err(AppError::Database(format!(
                "Field {} of {}/{} is not an array",
                field, collection, id
            )))
        }
    };
    mutate(&mut array);

    let mut patch = serde_json::Map::new();
    patch.insert(field.to_string(), serde_json::Value::Array(array));
    Ok(patch)
}

/// Apply an array-union to a JSON array in place.
pub(crate) fn union_into(array: &mut Vec<serde_json::Value>, values: &[String]) {
    for value in values {
        let value = serde_json::Value::String(value.clone());
        if !array.contains(&value) {
            array.push(value);
        }
    }
}

/// Apply an array-remove to a JSON array in place.
pub(crate) fn remove_from(array: &mut Vec<serde_json::Value>, values: &[String]) {
    array.retain(|v| !values.iter().any(|r| v.as_str() == Some(r.as_str())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_union_skips_existing() {
        let mut arr = vec![json!("a"), json!("b")];
        union_into(&mut arr, &["b".to_string(), "c".to_string()]);
        assert_eq!(arr, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_array_patch_rejects_scalar_field() {
        let doc = json!({ "friends": "nope", "mymeets": ["m1"] });
        assert!(array_patch(Some(&doc), "users", "u1", "friends", |_| {}).is_err());

        let patch = array_patch(Some(&doc), "users", "u1", "mymeets", |arr| {
            union_into(arr, &["m2".to_string()])
        })
        .unwrap();
        assert_eq!(patch["mymeets"], json!(["m1", "m2"]));

        let patch = array_patch(None, "users", "u1", "joinedmeets", |_| {}).unwrap();
        assert_eq!(patch["joinedmeets"], json!([]));
    }

    #[test]
    fn test_remove_drops_all_occurrences() {
        let mut arr = vec![json!("a"), json!("b"), json!("a"), json!(3)];
        remove_from(&mut arr, &["a".to_string()]);
        assert_eq!(arr, vec![json!("b"), json!(3)]);
    }
}
