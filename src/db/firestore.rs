// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper for the optional race archive.
//!
//! Provides:
//! - Upsert of relayed races keyed on series name, track, and start time
//! - Ordered read-back of archived races

use crate::db::collections;
use crate::error::AppError;
use crate::models::ArchivedRace;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

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

    /// Create an offline client: persistence disabled.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Whether a real backend is attached.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Race Archive ────────────────────────────────────────────

    /// Create or update races by natural key.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn upsert_races(&self, races: &[ArchivedRace]) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(races.to_vec())
            .map(|race| async move {
                let doc_id = race.natural_key();

                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::OFFICIAL_RACES)
                    .document_id(&doc_id)
                    .object(&race)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    /// Archived races ordered by start time, optionally only those starting
    /// at or after `from` (RFC3339).
    pub async fn list_races(
        &self,
        from: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ArchivedRace>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::OFFICIAL_RACES);

        let query = if let Some(from) = from {
            let from = from.to_string();
            query.filter(move |q| q.field("start_time").greater_than_or_equal(from.clone()))
        } else {
            query
        };

        query
            .order_by([
                ("start_time", firestore::FirestoreQueryDirection::Ascending),
                ("series_name", firestore::FirestoreQueryDirection::Ascending),
            ])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
