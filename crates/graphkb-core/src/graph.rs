//! Snapshot graph: a set of assets and a set of relations keyed by identity

use crate::model::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The knowledge graph of one source at one point in time.
///
/// Relations may reference assets that were never added explicitly.
/// Cloning produces an independent snapshot.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    assets: HashSet<Asset>,
    relations: HashSet<Relation>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("asset_count", &self.assets.len())
            .field("relation_count", &self.relations.len())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    /// Add an asset to the graph. Re-adding an existing identity is a no-op.
    pub fn add_asset(&mut self, asset_type: impl Into<AssetType>, key: impl Into<String>) -> Asset {
        let asset = Asset::new(asset_type, key);
        self.assets.insert(asset.clone());
        asset
    }

    /// Insert an already built asset. Returns false if it was present.
    pub fn insert_asset(&mut self, asset: Asset) -> bool {
        self.assets.insert(asset)
    }

    /// Add a relation between two assets. Re-adding an existing identity is a no-op.
    pub fn add_relation(
        &mut self,
        from: &Asset,
        relation_type: impl Into<RelationKeyType>,
        to: &Asset,
    ) -> Relation {
        let relation = Relation::new(from.clone(), relation_type, to.clone());
        self.relations.insert(relation.clone());
        relation
    }

    /// Insert an already built relation. Returns false if it was present.
    pub fn insert_relation(&mut self, relation: Relation) -> bool {
        self.relations.insert(relation)
    }

    /// Remove an asset. Relations referencing it are left untouched.
    pub fn remove_asset(&mut self, asset: &Asset) -> bool {
        self.assets.remove(asset)
    }

    pub fn remove_relation(&mut self, relation: &Relation) -> bool {
        self.relations.remove(relation)
    }

    pub fn contains_asset(&self, asset: &Asset) -> bool {
        self.assets.contains(asset)
    }

    pub fn contains_relation(&self, relation: &Relation) -> bool {
        self.relations.contains(relation)
    }

    /// Iterate over all assets, in no particular order.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    /// Iterate over all relations, in no particular order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.relations.is_empty()
    }

    /// Relations leaving the given asset.
    pub fn relations_from<'a>(&'a self, asset: &'a Asset) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| &r.from == asset)
    }

    /// Relations arriving at the given asset.
    pub fn relations_to<'a>(&'a self, asset: &'a Asset) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| &r.to == asset)
    }

    /// Drop every asset and relation.
    pub fn clear(&mut self) {
        self.assets.clear();
        self.relations.clear();
    }
}
