// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`DocumentStore`].
//!
//! Atomic updates (including the array mutators) run as a read-modify-write
//! inside a single-document transaction; nothing here spans documents.

use crate::db::{array_patch, remove_from, union_into, AtomicUpdate, DocumentStore};
use crate::error::AppError;
use serde::de::DeserializeOwned;
use firestore::errors::{BackoffError, FirestoreError};
use futures_util::FutureExt;
use serde::Serialize;
use std::sync::Arc;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Apply an array mutation through [`DocumentStore::update_atomic`].
    async fn mutate_array<F>(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        mutate: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&mut Vec<serde_json::Value>) + Send + Sync + 'static,
    {
        let (collection_id, document_id, field) =
            (collection.to_string(), id.to_string(), field.to_string());
        self.update_atomic(collection, id, move |doc| {
            let patch = array_patch(doc.as_ref(), &collection_id, &document_id, &field, &mutate)?;
            Ok((patch, ()))
        })
        .await
    }
}

impl DocumentStore for FirestoreDb {
    async fn get_document<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_documents<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn query_eq<T>(&self, collection: &str, filters: &[(&str, &str)]) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let filters: Vec<(String, String)> = filters
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect();

        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| {
                let exprs: Vec<_> = filters
                    .iter()
                    .map(|(field, value)| q.field(field.as_str()).eq(value.clone()))
                    .collect();
                q.for_all(exprs)
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_document<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(doc).map_err(|e| AppError::Internal(e.into()))?;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(&value)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn add_document<T>(&self, collection: &str, doc: &T) -> Result<String, AppError>
    where
        T: Serialize + Sync,
    {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.set_document(collection, &id, doc).await?;
        tracing::debug!(collection, id = %id, "Document created");
        Ok(id)
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), AppError> {
        let field_paths: Vec<String> = patch.keys().cloned().collect();

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(field_paths)
            .in_col(collection)
            .document_id(id)
            .object(&patch)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn update_atomic<F, R>(&self, collection: &str, id: &str, apply: F) -> Result<R, AppError>
    where
        F: Fn(Option<serde_json::Value>) -> Result<AtomicUpdate<R>, AppError>
            + Send
            + Sync
            + 'static,
        R: Send + 'static,
    {
        let apply = Arc::new(apply);
        let collection_id = collection.to_string();
        let document_id = id.to_string();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let apply = Arc::clone(&apply);
                let collection_id = collection_id.clone();
                let document_id = document_id.clone();
                async move {
                    // `db` is bound to the transaction, so this read is
                    // registered for conflict detection
                    let current: Option<serde_json::Value> = db
                        .fluent()
                        .select()
                        .by_id_in(&collection_id)
                        .obj()
                        .one(&document_id)
                        .await?;

                    let (patch, out) = match (*apply)(current) {
                        Ok(update) => update,
                        Err(e) => return Ok(Err(e)),
                    };

                    if !patch.is_empty() {
                        let field_paths: Vec<String> = patch.keys().cloned().collect();
                        db.fluent()
                            .update()
                            .fields(field_paths)
                            .in_col(&collection_id)
                            .document_id(&document_id)
                            .object(&patch)
                            .add_to_transaction(transaction)?;
                    }

                    Ok::<_, BackoffError<FirestoreError>>(Ok(out))
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Transaction failed: {}", e)))?;

        if let Err(e) = &outcome {
            tracing::debug!(collection, id, error = %e, "Atomic update refused");
        }
        outcome
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> Result<(), AppError> {
        let values = values.to_vec();
        self.mutate_array(collection, id, field, move |array| union_into(array, &values))
            .await
    }

    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[String],
    ) -> Result<(), AppError> {
        let values = values.to_vec();
        self.mutate_array(collection, id, field, move |array| remove_from(array, &values))
            .await
    }
}
