use crate::graph::types::{CooccurrenceEdge, EdgeKey};
use crate::types::EntityId;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Immutable point-in-time view of the co-occurrence graph.
///
/// Shares structure with the store it came from; cloning is cheap and
/// the contents never change, so analytics can run on it from any number
/// of threads while ingestion continues.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    version: u64,
    taken_at: DateTime<Utc>,
    nodes: Arc<BTreeSet<EntityId>>,
    edges: Arc<BTreeMap<EdgeKey, CooccurrenceEdge>>,
}

impl GraphSnapshot {
    pub(crate) fn new(
        version: u64,
        nodes: Arc<BTreeSet<EntityId>>,
        edges: Arc<BTreeMap<EdgeKey, CooccurrenceEdge>>,
    ) -> Self {
        Self {
            version,
            taken_at: Utc::now(),
            nodes,
            edges,
        }
    }

    /// Graph version the snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.nodes.iter().copied()
    }

    /// Edges in ascending key order.
    pub fn edges(&self) -> impl Iterator<Item = &CooccurrenceEdge> {
        self.edges.values()
    }

    pub fn edge(&self, x: EntityId, y: EntityId) -> Option<&CooccurrenceEdge> {
        EdgeKey::new(x, y).and_then(|key| self.edges.get(&key))
    }

    /// Weighted adjacency lists, neighbours in ascending id order.
    pub fn adjacency(&self) -> BTreeMap<EntityId, Vec<(EntityId, usize)>> {
        let mut adjacency: BTreeMap<EntityId, Vec<(EntityId, usize)>> =
            self.nodes.iter().map(|&id| (id, Vec::new())).collect();
        for edge in self.edges.values() {
            adjacency
                .entry(edge.entity_a)
                .or_default()
                .push((edge.entity_b, edge.weight));
            adjacency
                .entry(edge.entity_b)
                .or_default()
                .push((edge.entity_a, edge.weight));
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort_unstable();
        }
        adjacency
    }

    /// Induced sub-snapshot over the nodes accepted by `keep`, dropping
    /// edges lighter than `min_weight`. Nodes left without edges stay.
    ///
    /// Used for query-time filtering (entity type, minimum weight); the
    /// stored graph is never filtered.
    pub fn filtered<F>(&self, keep: F, min_weight: usize) -> GraphSnapshot
    where
        F: Fn(EntityId) -> bool,
    {
        let nodes: BTreeSet<EntityId> = self.nodes.iter().copied().filter(|&id| keep(id)).collect();
        let edges: BTreeMap<EdgeKey, CooccurrenceEdge> = self
            .edges
            .iter()
            .filter(|(key, edge)| {
                edge.weight >= min_weight && nodes.contains(&key.a()) && nodes.contains(&key.b())
            })
            .map(|(key, edge)| (*key, edge.clone()))
            .collect();
        Self {
            version: self.version,
            taken_at: self.taken_at,
            nodes: Arc::new(nodes),
            edges: Arc::new(edges),
        }
    }

    /// Induced sub-snapshot over the given ids. Unknown ids are ignored.
    pub fn subgraph(&self, ids: &[EntityId]) -> GraphSnapshot {
        let wanted: BTreeSet<EntityId> = ids.iter().copied().collect();
        self.filtered(|id| wanted.contains(&id), 0)
    }
}
