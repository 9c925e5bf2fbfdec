use crate::analytics::indexed::IndexedGraph;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeCentrality {
    pub entity_id: EntityId,
    pub degree: usize,
    /// Sum of incident edge weights (shared-document count).
    pub weighted_degree: usize,
    /// `degree / (n - 1)`, 0 for graphs with fewer than two nodes.
    pub score: f64,
}

pub(crate) fn degree_centrality(graph: &IndexedGraph) -> Vec<DegreeCentrality> {
    let n = graph.len();
    graph
        .ids
        .iter()
        .zip(&graph.neighbors)
        .map(|(&entity_id, neighbors)| {
            let degree = neighbors.len();
            DegreeCentrality {
                entity_id,
                degree,
                weighted_degree: neighbors.iter().map(|&(_, w)| w).sum(),
                score: if n > 1 {
                    degree as f64 / (n - 1) as f64
                } else {
                    0.0
                },
            }
        })
        .collect()
}
