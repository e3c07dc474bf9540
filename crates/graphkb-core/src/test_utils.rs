//! Test utilities for graphkb-core

use crate::graph::Graph;
use crate::model::{Asset, Relation};
use tempfile::TempDir;

/// Two IP assets linked together: `127.0.0.1 -linked-> 192.168.0.1`.
pub fn create_ip_graph() -> (Graph, Asset, Asset, Relation) {
    let mut graph = Graph::new();
    let ip1 = graph.add_asset("ip", "127.0.0.1");
    let ip2 = graph.add_asset("ip", "192.168.0.1");
    let rel = graph.add_relation(&ip1, "linked", &ip2);
    (graph, ip1, ip2, rel)
}

/// Sort a copy of the slice so unordered sequences can be compared.
pub fn sorted<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort();
    items
}

/// Empty directory for snapshot files.
pub fn create_snapshot_dir() -> TempDir {
    TempDir::new().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ip_graph() {
        let (graph, ip1, ip2, rel) = create_ip_graph();
        assert_eq!(graph.asset_count(), 2);
        assert_eq!(graph.relation_count(), 1);
        assert_eq!(rel.from, ip1);
        assert_eq!(rel.to, ip2);
    }
}
