//! Schema of a source: the asset types and relation types it publishes

use crate::graph::Graph;
use crate::model::{AssetType, RelationKeyType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A relation type together with the asset types of its endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationType {
    pub from_type: AssetType,
    pub to_type: AssetType,
    #[serde(rename = "type")]
    pub relation_type: RelationKeyType,
}

impl RelationType {
    pub fn new(
        from_type: impl Into<AssetType>,
        relation_type: impl Into<RelationKeyType>,
        to_type: impl Into<AssetType>,
    ) -> Self {
        RelationType {
            from_type: from_type.into(),
            to_type: to_type.into(),
            relation_type: relation_type.into(),
        }
    }
}

/// Type-level view of a source graph. Two schemas are equal when they carry
/// the same asset types and the same relation types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaGraph {
    assets: BTreeSet<AssetType>,
    relations: BTreeSet<RelationType>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        SchemaGraph::default()
    }

    /// Extract the schema published by a graph.
    pub fn from_graph(graph: &Graph) -> Self {
        let mut schema = SchemaGraph::new();
        for asset in graph.assets() {
            schema.add_asset(asset.asset_type.clone());
        }
        for relation in graph.relations() {
            schema.add_relation(RelationType {
                from_type: relation.from.asset_type.clone(),
                to_type: relation.to.asset_type.clone(),
                relation_type: relation.relation_type.clone(),
            });
        }
        schema
    }

    pub fn add_asset(&mut self, asset_type: impl Into<AssetType>) {
        self.assets.insert(asset_type.into());
    }

    /// Register a relation type; its endpoint types become asset types too.
    pub fn add_relation(&mut self, relation_type: RelationType) {
        self.assets.insert(relation_type.from_type.clone());
        self.assets.insert(relation_type.to_type.clone());
        self.relations.insert(relation_type);
    }

    pub fn asset_types(&self) -> impl Iterator<Item = &AssetType> {
        self.assets.iter()
    }

    pub fn relation_types(&self) -> impl Iterator<Item = &RelationType> {
        self.relations.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.relations.is_empty()
    }
}
