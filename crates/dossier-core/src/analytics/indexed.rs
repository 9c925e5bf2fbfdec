use crate::graph::GraphSnapshot;
use crate::types::EntityId;
use std::collections::HashMap;

/// Dense, index-addressed copy of a snapshot for the inner loops.
/// Node `i` is the i-th smallest entity id; neighbour lists are sorted.
#[derive(Debug, Clone)]
pub(crate) struct IndexedGraph {
    pub(crate) ids: Vec<EntityId>,
    pub(crate) neighbors: Vec<Vec<(usize, usize)>>,
}

impl IndexedGraph {
    pub(crate) fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        let ids: Vec<EntityId> = snapshot.nodes().collect();
        let index: HashMap<EntityId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let mut neighbors = vec![Vec::new(); ids.len()];
        for edge in snapshot.edges() {
            let (Some(&a), Some(&b)) = (index.get(&edge.entity_a), index.get(&edge.entity_b)) else {
                continue;
            };
            neighbors[a].push((b, edge.weight));
            neighbors[b].push((a, edge.weight));
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }
        Self { ids, neighbors }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}
