//! Apply source updates to the graph store

use crate::listener::SourceSubGraphUpdates;
use crate::store::{GraphStore, SchemaPersistor, StoreError};
use graphkb_core::{Asset, Relation, SchemaGraph};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("unable to update schema of source {source_name}: {error}")]
    Schema {
        source_name: String,
        #[source]
        error: StoreError,
    },
    #[error("unable to insert assets from source {source_name}: {error}")]
    InsertAssets {
        source_name: String,
        #[source]
        error: StoreError,
    },
    #[error("unable to insert relations from source {source_name}: {error}")]
    InsertRelations {
        source_name: String,
        #[source]
        error: StoreError,
    },
    #[error("unable to remove assets from source {source_name}: {error}")]
    RemoveAssets {
        source_name: String,
        #[source]
        error: StoreError,
    },
    #[error("unable to remove relations from source {source_name}: {error}")]
    RemoveRelations {
        source_name: String,
        #[source]
        error: StoreError,
    },
}

/// Writes source updates through to storage. Errors are wrapped with the
/// source name and never retried.
pub struct GraphUpdater {
    store: Arc<dyn GraphStore>,
    schemas: Arc<dyn SchemaPersistor>,
}

impl GraphUpdater {
    pub fn new(store: Arc<dyn GraphStore>, schemas: Arc<dyn SchemaPersistor>) -> Self {
        GraphUpdater { store, schemas }
    }

    /// Save the schema unless it equals the one already stored. Returns
    /// whether it was saved.
    pub async fn update_schema(&self, source: &str, schema: &SchemaGraph) -> Result<bool, UpdateError> {
        let wrap = |error| UpdateError::Schema {
            source_name: source.to_string(),
            error,
        };
        let previous = self.schemas.load_schema(source).await.map_err(wrap)?;
        if previous.as_ref() == Some(schema) {
            tracing::debug!("Schema of {} unchanged", source);
            return Ok(false);
        }
        self.schemas.save_schema(source, schema).await.map_err(wrap)?;
        tracing::info!("Schema of {} updated", source);
        Ok(true)
    }

    pub async fn insert_assets(&self, source: &str, assets: &[Asset]) -> Result<(), UpdateError> {
        self.store
            .insert_assets(source, assets)
            .await
            .map_err(|error| UpdateError::InsertAssets {
                source_name: source.to_string(),
                error,
            })
    }

    pub async fn insert_relations(&self, source: &str, relations: &[Relation]) -> Result<(), UpdateError> {
        self.store
            .insert_relations(source, relations)
            .await
            .map_err(|error| UpdateError::InsertRelations {
                source_name: source.to_string(),
                error,
            })
    }

    pub async fn remove_assets(&self, source: &str, assets: &[Asset]) -> Result<(), UpdateError> {
        self.store
            .remove_assets(source, assets)
            .await
            .map_err(|error| UpdateError::RemoveAssets {
                source_name: source.to_string(),
                error,
            })
    }

    pub async fn remove_relations(&self, source: &str, relations: &[Relation]) -> Result<(), UpdateError> {
        self.store
            .remove_relations(source, relations)
            .await
            .map_err(|error| UpdateError::RemoveRelations {
                source_name: source.to_string(),
                error,
            })
    }

    /// Apply one publish cycle: schema, inserted assets, inserted relations,
    /// removed relations, removed assets. Stops at the first failure.
    pub async fn apply(&self, update: &SourceSubGraphUpdates) -> Result<(), UpdateError> {
        let source = update.source.as_str();
        let bulk = &update.updates;

        self.update_schema(source, &update.schema).await?;
        if !bulk.asset_upserts.is_empty() {
            self.insert_assets(source, &bulk.asset_upserts).await?;
        }
        if !bulk.relation_upserts.is_empty() {
            self.insert_relations(source, &bulk.relation_upserts).await?;
        }
        if !bulk.relation_removals.is_empty() {
            self.remove_relations(source, &bulk.relation_removals).await?;
        }
        if !bulk.asset_removals.is_empty() {
            self.remove_assets(source, &bulk.asset_removals).await?;
        }

        tracing::info!(
            "Applied updates of {}: +{} assets, +{} relations, -{} relations, -{} assets",
            source,
            bulk.asset_upserts.len(),
            bulk.relation_upserts.len(),
            bulk.relation_removals.len(),
            bulk.asset_removals.len()
        );
        Ok(())
    }
}
