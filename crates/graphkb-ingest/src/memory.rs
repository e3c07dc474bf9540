//! In-memory graph store

use crate::store::{GraphStore, SchemaPersistor, StoreError};
use dashmap::DashMap;
use graphkb_core::{Asset, Graph, Relation, SchemaGraph};
use std::collections::HashSet;

/// Graphs and schemas keyed by source name. Safe for concurrent access.
#[derive(Debug, Default)]
pub struct MemoryStore {
    graphs: DashMap<String, Graph>,
    schemas: DashMap<String, SchemaGraph>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Run `f` on the graph of a source, creating it if needed.
    pub(crate) fn update_graph(&self, source: &str, f: impl FnOnce(&mut Graph)) {
        let mut graph = self.graphs.entry(source.to_string()).or_default();
        f(graph.value_mut());
    }

    /// Like `update_graph`, but leaves unknown sources alone.
    pub(crate) fn update_existing(&self, source: &str, f: impl FnOnce(&mut Graph)) {
        if let Some(mut graph) = self.graphs.get_mut(source) {
            f(graph.value_mut());
        }
    }

    pub(crate) fn graph(&self, source: &str) -> Option<Graph> {
        self.graphs.get(source).map(|g| g.value().clone())
    }

    pub(crate) fn put_graph(&self, source: &str, graph: Graph) {
        self.graphs.insert(source.to_string(), graph);
    }

    pub(crate) fn schema(&self, source: &str) -> Option<SchemaGraph> {
        self.schemas.get(source).map(|s| s.value().clone())
    }

    pub(crate) fn put_schema(&self, source: &str, schema: SchemaGraph) {
        self.schemas.insert(source.to_string(), schema);
    }

    pub(crate) fn source_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.graphs.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub(crate) fn clear(&self) {
        self.graphs.clear();
        self.schemas.clear();
    }

    fn distinct_assets(&self) -> usize {
        let mut seen = HashSet::new();
        for entry in self.graphs.iter() {
            seen.extend(entry.value().assets().cloned());
        }
        seen.len()
    }

    fn distinct_relations(&self) -> usize {
        let mut seen = HashSet::new();
        for entry in self.graphs.iter() {
            seen.extend(entry.value().relations().cloned());
        }
        seen.len()
    }
}

#[async_trait::async_trait]
impl GraphStore for MemoryStore {
    async fn insert_assets(&self, source: &str, assets: &[Asset]) -> Result<(), StoreError> {
        self.update_graph(source, |graph| {
            for asset in assets {
                graph.insert_asset(asset.clone());
            }
        });
        Ok(())
    }

    async fn remove_assets(&self, source: &str, assets: &[Asset]) -> Result<(), StoreError> {
        self.update_existing(source, |graph| {
            for asset in assets {
                graph.remove_asset(asset);
            }
        });
        Ok(())
    }

    async fn insert_relations(&self, source: &str, relations: &[Relation]) -> Result<(), StoreError> {
        self.update_graph(source, |graph| {
            for relation in relations {
                graph.insert_relation(relation.clone());
            }
        });
        Ok(())
    }

    async fn remove_relations(&self, source: &str, relations: &[Relation]) -> Result<(), StoreError> {
        self.update_existing(source, |graph| {
            for relation in relations {
                graph.remove_relation(relation);
            }
        });
        Ok(())
    }

    async fn read_graph(&self, source: &str) -> Result<Option<Graph>, StoreError> {
        Ok(self.graph(source))
    }

    async fn sources(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.source_names())
    }

    async fn count_assets(&self) -> Result<usize, StoreError> {
        Ok(self.distinct_assets())
    }

    async fn count_relations(&self) -> Result<usize, StoreError> {
        Ok(self.distinct_relations())
    }

    async fn flush_all(&self) -> Result<(), StoreError> {
        self.clear();
        tracing::info!("Memory store flushed");
        Ok(())
    }
}

#[async_trait::async_trait]
impl SchemaPersistor for MemoryStore {
    async fn load_schema(&self, source: &str) -> Result<Option<SchemaGraph>, StoreError> {
        Ok(self.schema(source))
    }

    async fn save_schema(&self, source: &str, schema: &SchemaGraph) -> Result<(), StoreError> {
        self.put_schema(source, schema.clone());
        Ok(())
    }
}
