//! Binder letting data sources describe assets by key and type

use crate::graph::Graph;
use crate::model::{Asset, AssetType, Relation};
use crate::schema::RelationType;

/// Thin layer over a [`Graph`] building asset identities on behalf of the caller.
///
/// Keys are not validated; an empty key is bound like any other.
pub struct GraphBinder<'a> {
    graph: &'a mut Graph,
}

impl<'a> GraphBinder<'a> {
    pub fn new(graph: &'a mut Graph) -> Self {
        GraphBinder { graph }
    }

    /// Ensure an asset with this key and type exists.
    pub fn bind(&mut self, key: &str, asset_type: impl Into<AssetType>) -> Asset {
        self.graph.add_asset(asset_type, key)
    }

    /// Ensure both endpoints exist, typed from `relation_type`, and relate them.
    pub fn relate(&mut self, from: &str, relation_type: &RelationType, to: &str) -> Relation {
        let from_asset = self.graph.add_asset(relation_type.from_type.clone(), from);
        let to_asset = self.graph.add_asset(relation_type.to_type.clone(), to);
        self.graph
            .add_relation(&from_asset, relation_type.relation_type.clone(), &to_asset)
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }
}
