//! Graph diff computation for incremental source updates

use crate::graph::Graph;
use crate::model::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Pending action attached to an entry while two snapshots are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryAction {
    Add,
    Remove,
    Keep,
}

/// The minimal set of changes turning one snapshot into another.
///
/// The four sequences are disjoint and carry no ordering guarantee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphUpdatesBulk {
    /// Assets present in the new snapshot only.
    pub asset_upserts: Vec<Asset>,
    /// Relations present in the new snapshot only.
    pub relation_upserts: Vec<Relation>,
    /// Assets present in the old snapshot only.
    pub asset_removals: Vec<Asset>,
    /// Relations present in the old snapshot only.
    pub relation_removals: Vec<Relation>,
}

impl GraphUpdatesBulk {
    pub fn new() -> Self {
        GraphUpdatesBulk::default()
    }

    /// Check if this bulk is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.asset_upserts.is_empty()
            && self.relation_upserts.is_empty()
            && self.asset_removals.is_empty()
            && self.relation_removals.is_empty()
    }

    /// Total number of operations carried by the bulk.
    pub fn len(&self) -> usize {
        self.asset_upserts.len()
            + self.relation_upserts.len()
            + self.asset_removals.len()
            + self.relation_removals.len()
    }

    /// Replay the bulk onto a graph.
    pub fn apply_to(&self, graph: &mut Graph) {
        for relation in &self.relation_removals {
            graph.remove_relation(relation);
        }
        for asset in &self.asset_removals {
            graph.remove_asset(asset);
        }
        for asset in &self.asset_upserts {
            graph.insert_asset(asset.clone());
        }
        for relation in &self.relation_upserts {
            graph.insert_relation(relation.clone());
        }
    }
}

/// Compute the updates turning `old` into `new`. A missing side is the empty graph.
pub fn generate_graph_updates_bulk(old: Option<&Graph>, new: Option<&Graph>) -> GraphUpdatesBulk {
    let (asset_upserts, asset_removals) = diff_entries(
        old.into_iter().flat_map(|g| g.assets()),
        new.into_iter().flat_map(|g| g.assets()),
    );
    let (relation_upserts, relation_removals) = diff_entries(
        old.into_iter().flat_map(|g| g.relations()),
        new.into_iter().flat_map(|g| g.relations()),
    );

    let bulk = GraphUpdatesBulk {
        asset_upserts,
        relation_upserts,
        asset_removals,
        relation_removals,
    };

    tracing::debug!(
        "Generated bulk: {} asset upserts, {} relation upserts, {} asset removals, {} relation removals",
        bulk.asset_upserts.len(),
        bulk.relation_upserts.len(),
        bulk.asset_removals.len(),
        bulk.relation_removals.len()
    );
    bulk
}

/// Tag every entry of both sides and split them into (upserts, removals).
fn diff_entries<'a, T>(
    old: impl Iterator<Item = &'a T>,
    new: impl Iterator<Item = &'a T>,
) -> (Vec<T>, Vec<T>)
where
    T: Eq + Hash + Clone + 'a,
{
    let mut actions: HashMap<&'a T, EntryAction> = HashMap::new();
    for entry in old {
        actions.insert(entry, EntryAction::Remove);
    }
    for entry in new {
        actions
            .entry(entry)
            .and_modify(|action| {
                if *action == EntryAction::Remove {
                    *action = EntryAction::Keep;
                }
            })
            .or_insert(EntryAction::Add);
    }

    let mut upserts = Vec::new();
    let mut removals = Vec::new();
    for (entry, action) in actions {
        match action {
            EntryAction::Add => upserts.push(entry.clone()),
            EntryAction::Remove => removals.push(entry.clone()),
            EntryAction::Keep => {}
        }
    }
    (upserts, removals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_tagging() {
        let old = vec![1, 2, 3];
        let new = vec![2, 3, 4];
        let (mut upserts, mut removals) = diff_entries(old.iter(), new.iter());
        upserts.sort();
        removals.sort();
        assert_eq!(upserts, vec![4]);
        assert_eq!(removals, vec![1]);
    }

    #[test]
    fn test_duplicate_entries_on_one_side() {
        let (upserts, removals) = diff_entries([7, 7].iter(), [7].iter());
        assert!(upserts.is_empty());
        assert!(removals.is_empty());
    }
}
