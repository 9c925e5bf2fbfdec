use crate::graph::GraphSnapshot;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Summary statistics for a graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// `2E / (V (V - 1))`, 0 for fewer than two nodes.
    pub density: f64,
    /// Connected components, isolated nodes included.
    pub components: usize,
    pub avg_degree: f64,
    /// Mean of per-node summed edge weights.
    pub avg_weighted_degree: f64,
}

impl GraphSnapshot {
    pub fn stats(&self) -> GraphStats {
        let n = self.node_count();
        if n == 0 {
            return GraphStats::default();
        }
        let e = self.edge_count();
        let total_weight: usize = self.edges().map(|edge| edge.weight).sum();
        let density = if n > 1 {
            (2 * e) as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };

        GraphStats {
            node_count: n,
            edge_count: e,
            density,
            components: self.components().len(),
            avg_degree: (2 * e) as f64 / n as f64,
            avg_weighted_degree: (2 * total_weight) as f64 / n as f64,
        }
    }

    /// Connected components. Each component is sorted by id; components
    /// are ordered by their smallest id.
    pub fn components(&self) -> Vec<Vec<EntityId>> {
        let adjacency = self.adjacency();
        let mut visited = BTreeSet::new();
        let mut components = Vec::new();

        for &start in adjacency.keys() {
            if !visited.insert(start) {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                component.push(node);
                if let Some(neighbors) = adjacency.get(&node) {
                    for &(neighbor, _) in neighbors {
                        if visited.insert(neighbor) {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        components
    }
}
