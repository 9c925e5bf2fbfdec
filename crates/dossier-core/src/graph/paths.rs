use crate::graph::GraphSnapshot;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

/// Strongest-link path between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    /// Ordered nodes from source to target, both included.
    pub nodes: Vec<EntityId>,
    /// Weight of each hop; `weights[i]` joins `nodes[i]` and `nodes[i + 1]`.
    pub weights: Vec<usize>,
    /// Sum of hop weights.
    pub total_weight: usize,
    pub hops: usize,
    /// Path cost under `1 / weight` distances.
    pub distance: f64,
}

/// A node reached by a bounded neighbourhood expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub entity_id: EntityId,
    /// Weight of the edge the node was reached through.
    pub weight: usize,
    /// Hop distance from the start node (1 = direct neighbour).
    pub hop: u32,
}

/// State for Dijkstra's algorithm
#[derive(Debug, Clone, Copy)]
struct DijkstraState {
    node: EntityId,
    cost: f64,
}

impl PartialEq for DijkstraState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DijkstraState {}

impl PartialOrd for DijkstraState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DijkstraState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower cost = higher priority (min-heap), lower id breaks ties
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl GraphSnapshot {
    /// Dijkstra over `1 / weight` distances: frequently co-occurring pairs
    /// are close. Returns None if either node is unknown or no path exists.
    pub fn shortest_path(&self, from: EntityId, to: EntityId) -> Option<PathResult> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(PathResult {
                nodes: vec![from],
                weights: Vec::new(),
                total_weight: 0,
                hops: 0,
                distance: 0.0,
            });
        }

        let adjacency = self.adjacency();
        let mut dist: HashMap<EntityId, f64> = HashMap::from([(from, 0.0)]);
        let mut parent: HashMap<EntityId, (EntityId, usize)> = HashMap::new();
        let mut heap = BinaryHeap::from([DijkstraState {
            node: from,
            cost: 0.0,
        }]);

        while let Some(DijkstraState { node, cost }) = heap.pop() {
            if node == to {
                break;
            }
            if dist.get(&node).is_some_and(|&best| cost > best) {
                continue;
            }
            for &(neighbor, weight) in adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
                if weight == 0 {
                    continue;
                }
                let next = cost + 1.0 / weight as f64;
                if dist.get(&neighbor).map_or(true, |&best| next < best) {
                    dist.insert(neighbor, next);
                    parent.insert(neighbor, (node, weight));
                    heap.push(DijkstraState {
                        node: neighbor,
                        cost: next,
                    });
                }
            }
        }

        let distance = *dist.get(&to)?;
        let mut nodes = vec![to];
        let mut weights = Vec::new();
        let mut current = to;
        while current != from {
            let &(prev, weight) = parent.get(&current)?;
            nodes.push(prev);
            weights.push(weight);
            current = prev;
        }
        nodes.reverse();
        weights.reverse();

        Some(PathResult {
            hops: weights.len(),
            total_weight: weights.iter().sum(),
            nodes,
            weights,
            distance,
        })
    }

    /// Breadth-first neighbourhood within `hops`, following only edges of
    /// at least `min_weight`. Sorted by weight (desc), then hop, then id.
    pub fn neighbors(&self, id: EntityId, hops: u32, min_weight: usize) -> Vec<Neighbor> {
        if !self.contains(id) {
            return Vec::new();
        }
        let adjacency = self.adjacency();
        let mut visited = BTreeSet::from([id]);
        let mut frontier = vec![id];
        let mut results = Vec::new();

        for hop in 1..=hops {
            let mut next = Vec::new();
            for node in frontier {
                for &(neighbor, weight) in adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
                    if weight < min_weight || visited.contains(&neighbor) {
                        continue;
                    }
                    visited.insert(neighbor);
                    results.push(Neighbor {
                        entity_id: neighbor,
                        weight,
                        hop,
                    });
                    next.push(neighbor);
                }
            }
            if next.is_empty() {
                break;
            }
            next.sort_unstable();
            frontier = next;
        }

        results.sort_by(|a, b| {
            b.weight
                .cmp(&a.weight)
                .then(a.hop.cmp(&b.hop))
                .then(a.entity_id.cmp(&b.entity_id))
        });
        results
    }
}
