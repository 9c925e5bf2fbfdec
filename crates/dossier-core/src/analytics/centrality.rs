//! Closeness and eigenvector centrality.
//!
//! Closeness reuses the single-source passes from Brandes, so it follows
//! the same path cost. Eigenvector centrality is a weighted power
//! iteration on `A + I`, which converges on bipartite graphs where plain
//! `A` would oscillate.

use crate::analytics::betweenness::shortest_paths;
use crate::analytics::budget::Deadline;
use crate::analytics::config::AnalyticsConfig;
use crate::analytics::indexed::IndexedGraph;
use crate::error::Result;
use crate::types::EntityId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosenessCentrality {
    pub entity_id: EntityId,
    pub closeness_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenvectorCentrality {
    pub entity_id: EntityId,
    pub eigenvector_score: f64,
}

/// Closeness for every node, in ascending id order.
///
/// Scaled by the reachable fraction of the graph (Wasserman and Faust),
/// so a node central to a small component does not outrank one central
/// to a large component. Isolated nodes score 0.
pub(crate) fn closeness(
    graph: &IndexedGraph,
    config: &AnalyticsConfig,
    deadline: &Deadline,
) -> Result<Vec<ClosenessCentrality>> {
    let n = graph.len();
    let completed = AtomicUsize::new(0);

    let score_of = |source: usize| -> Result<f64> {
        deadline.check(completed.load(Ordering::Relaxed), n)?;
        let pass = shortest_paths(graph, source, config.path_cost);
        let (reached, total) = pass
            .distance
            .iter()
            .enumerate()
            .filter(|&(node, _)| node != source)
            .filter_map(|(_, d)| *d)
            .fold((0usize, 0.0), |(count, sum), d| (count + 1, sum + d));
        completed.fetch_add(1, Ordering::Relaxed);

        if total <= 0.0 || n < 2 {
            return Ok(0.0);
        }
        let reached = reached as f64;
        Ok((reached / total) * (reached / (n - 1) as f64))
    };

    let scores: Vec<Result<f64>> = if config.parallel {
        (0..n).into_par_iter().map(score_of).collect()
    } else {
        (0..n).map(score_of).collect()
    };

    graph
        .ids
        .iter()
        .zip(scores)
        .map(|(&entity_id, score)| {
            Ok(ClosenessCentrality {
                entity_id,
                closeness_score: score?,
            })
        })
        .collect()
}

/// Eigenvector centrality for every node, in ascending id order.
///
/// Edge weight is the coupling strength. The vector is L2-normalised.
/// If the iteration has not settled after `eigenvector_max_iter` rounds
/// every node scores 0.
pub(crate) fn eigenvector(
    graph: &IndexedGraph,
    config: &AnalyticsConfig,
    deadline: &Deadline,
) -> Result<Vec<EigenvectorCentrality>> {
    let n = graph.len();
    let scores = power_iteration(graph, config, deadline)?.unwrap_or_else(|| {
        log::warn!(
            "Eigenvector centrality did not converge in {} iterations over {} nodes",
            config.eigenvector_max_iter,
            n
        );
        vec![0.0; n]
    });

    Ok(graph
        .ids
        .iter()
        .zip(scores)
        .map(|(&entity_id, eigenvector_score)| EigenvectorCentrality {
            entity_id,
            eigenvector_score,
        })
        .collect())
}

/// None when the iteration budget runs out first.
fn power_iteration(
    graph: &IndexedGraph,
    config: &AnalyticsConfig,
    deadline: &Deadline,
) -> Result<Option<Vec<f64>>> {
    let n = graph.len();
    if n == 0 {
        return Ok(Some(Vec::new()));
    }

    let max_iter = config.eigenvector_max_iter;
    let threshold = n as f64 * config.eigenvector_tolerance;
    let mut x = vec![1.0 / n as f64; n];

    for round in 0..max_iter {
        deadline.check(round, max_iter)?;
        let last = x.clone();
        for (node, adjacent) in graph.neighbors.iter().enumerate() {
            for &(other, weight) in adjacent {
                x[other] += last[node] * weight as f64;
            }
        }

        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        for v in x.iter_mut() {
            *v /= norm;
        }

        let change: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if change < threshold {
            return Ok(Some(x));
        }
    }
    Ok(None)
}
