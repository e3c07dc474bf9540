//! Data-source side transaction

use crate::listener::SourceSubGraphUpdates;
use graphkb_core::{
    Asset, AssetType, Graph, GraphBinder, Relation, RelationType, SchemaGraph, generate_graph_updates_bulk,
};

/// Collects the full graph of a source for one publish cycle.
pub struct Transaction {
    source: String,
    previous: Option<Graph>,
    graph: Graph,
}

impl Transaction {
    /// `previous` is the graph the source published last, if any.
    pub fn new(source: impl Into<String>, previous: Option<Graph>) -> Self {
        Transaction {
            source: source.into(),
            previous,
            graph: Graph::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bind(&mut self, key: &str, asset_type: impl Into<AssetType>) -> Asset {
        GraphBinder::new(&mut self.graph).bind(key, asset_type)
    }

    pub fn relate(&mut self, from: &str, relation_type: &RelationType, to: &str) -> Relation {
        GraphBinder::new(&mut self.graph).relate(from, relation_type, to)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Diff the collected graph against the previous one. Returns the event
    /// to publish and the graph to keep as the next previous snapshot.
    pub fn commit(self) -> (SourceSubGraphUpdates, Graph) {
        let updates = generate_graph_updates_bulk(self.previous.as_ref(), Some(&self.graph));
        let schema = SchemaGraph::from_graph(&self.graph);
        tracing::debug!("Transaction of {} committed with {} updates", self.source, updates.len());
        (
            SourceSubGraphUpdates {
                source: self.source,
                updates,
                schema,
            },
            self.graph,
        )
    }
}
