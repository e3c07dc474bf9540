//! graphkb core: asset/relation model, snapshot graph, diff engine and binder

pub mod binder;
pub mod diff;
pub mod graph;
pub mod model;
pub mod schema;
pub mod snapshot;


#[cfg(test)]
pub mod test_utils;

pub use binder::GraphBinder;
pub use diff::{GraphUpdatesBulk, generate_graph_updates_bulk};
pub use graph::Graph;
pub use model::{Asset, AssetType, Relation, RelationKeyType};
pub use schema::{RelationType, SchemaGraph};
pub use snapshot::{
    SNAPSHOT_EXTENSION, SnapshotError, clear_snapshots, list_snapshots, load_snapshot,
    remove_snapshot, save_snapshot, snapshot_path, validate_source_name,
};
