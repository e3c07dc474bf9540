//! Storage contracts of the ingestion pipeline

use graphkb_core::{Asset, Graph, Relation, SchemaGraph, SnapshotError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("schema encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Per-source storage of assets and relations.
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    async fn insert_assets(&self, source: &str, assets: &[Asset]) -> Result<(), StoreError>;

    async fn remove_assets(&self, source: &str, assets: &[Asset]) -> Result<(), StoreError>;

    async fn insert_relations(&self, source: &str, relations: &[Relation]) -> Result<(), StoreError>;

    async fn remove_relations(&self, source: &str, relations: &[Relation]) -> Result<(), StoreError>;

    /// Current graph of a source, `None` if the source never published.
    async fn read_graph(&self, source: &str) -> Result<Option<Graph>, StoreError>;

    /// Names of the known sources, sorted.
    async fn sources(&self) -> Result<Vec<String>, StoreError>;

    /// Number of distinct assets across all sources.
    async fn count_assets(&self) -> Result<usize, StoreError>;

    /// Number of distinct relations across all sources.
    async fn count_relations(&self) -> Result<usize, StoreError>;

    /// Drop every source.
    async fn flush_all(&self) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
pub trait SchemaPersistor: Send + Sync {
    /// Last saved schema of a source, `None` if none was saved.
    async fn load_schema(&self, source: &str) -> Result<Option<SchemaGraph>, StoreError>;

    async fn save_schema(&self, source: &str, schema: &SchemaGraph) -> Result<(), StoreError>;
}
