//! Brandes' betweenness centrality.
//!
//! One single-source shortest-path pass per node, then a reverse sweep
//! accumulating pair dependencies. All shortest paths are counted, so
//! tied routes share credit. Nodes in other components are unreachable
//! and contribute nothing.

use crate::analytics::budget::Deadline;
use crate::analytics::config::{AnalyticsConfig, PathCost};
use crate::analytics::indexed::IndexedGraph;
use crate::error::Result;
use crate::types::EntityId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Sources handled per work unit. Fixed so the summation order, and with
/// it the floating-point result, does not depend on the thread count.
const SOURCES_PER_CHUNK: usize = 32;

/// Distances closer than this are treated as equal-length paths.
const PATH_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityResult {
    pub entity_id: EntityId,
    pub betweenness_score: f64,
}

/// Betweenness for every node of the graph, in ascending id order.
pub(crate) fn betweenness(
    graph: &IndexedGraph,
    config: &AnalyticsConfig,
    deadline: &Deadline,
) -> Result<Vec<CentralityResult>> {
    let n = graph.len();
    let sources: Vec<usize> = (0..n).collect();
    let completed = AtomicUsize::new(0);

    let run_chunk = |chunk: &[usize]| -> Result<Vec<f64>> {
        let mut partial = vec![0.0; n];
        for &source in chunk {
            deadline.check(completed.load(AtomicOrdering::Relaxed), n)?;
            let pass = shortest_paths(graph, source, config.path_cost);
            accumulate(&pass, source, &mut partial);
            completed.fetch_add(1, AtomicOrdering::Relaxed);
        }
        Ok(partial)
    };

    let partials: Vec<Result<Vec<f64>>> = if config.parallel {
        sources.par_chunks(SOURCES_PER_CHUNK).map(run_chunk).collect()
    } else {
        sources.chunks(SOURCES_PER_CHUNK).map(run_chunk).collect()
    };

    let mut scores = vec![0.0; n];
    for partial in partials {
        for (total, value) in scores.iter_mut().zip(partial?) {
            *total += value;
        }
    }

    // Undirected: every pair was visited from both ends.
    let scale = if config.normalized {
        if n > 2 {
            1.0 / ((n - 1) * (n - 2)) as f64
        } else {
            1.0
        }
    } else {
        0.5
    };

    Ok(graph
        .ids
        .iter()
        .zip(scores)
        .map(|(&entity_id, raw)| CentralityResult {
            entity_id,
            betweenness_score: raw * scale,
        })
        .collect())
}

/// Shortest-path DAG from one source.
pub(crate) struct SourcePass {
    /// Nodes in order of non-decreasing distance.
    pub(crate) order: Vec<usize>,
    pub(crate) predecessors: Vec<Vec<usize>>,
    /// Number of shortest paths from the source.
    pub(crate) sigma: Vec<f64>,
    /// Path cost from the source; None when unreachable.
    pub(crate) distance: Vec<Option<f64>>,
}

/// Single-source pass under the configured path cost.
pub(crate) fn shortest_paths(graph: &IndexedGraph, source: usize, cost: PathCost) -> SourcePass {
    match cost {
        PathCost::Unweighted => bfs_pass(graph, source),
        PathCost::InverseWeight => dijkstra_pass(graph, source),
    }
}

fn bfs_pass(graph: &IndexedGraph, source: usize) -> SourcePass {
    let n = graph.len();
    let mut order = Vec::with_capacity(n);
    let mut predecessors = vec![Vec::new(); n];
    let mut sigma = vec![0.0; n];
    let mut dist: Vec<Option<usize>> = vec![None; n];

    sigma[source] = 1.0;
    dist[source] = Some(0);
    let mut queue = VecDeque::from([source]);

    while let Some(v) = queue.pop_front() {
        order.push(v);
        let Some(dv) = dist[v] else {
            continue;
        };
        for &(w, _) in &graph.neighbors[v] {
            if dist[w].is_none() {
                dist[w] = Some(dv + 1);
                queue.push_back(w);
            }
            if dist[w] == Some(dv + 1) {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    SourcePass {
        order,
        predecessors,
        sigma,
        distance: dist.into_iter().map(|d| d.map(|hops| hops as f64)).collect(),
    }
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    node: usize,
    cost: f64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost, lower index first on ties
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

fn dijkstra_pass(graph: &IndexedGraph, source: usize) -> SourcePass {
    let n = graph.len();
    let mut order = Vec::with_capacity(n);
    let mut predecessors = vec![Vec::new(); n];
    let mut sigma = vec![0.0; n];
    let mut dist: Vec<Option<f64>> = vec![None; n];
    let mut settled = vec![false; n];

    sigma[source] = 1.0;
    dist[source] = Some(0.0);
    let mut heap = BinaryHeap::from([QueueEntry {
        node: source,
        cost: 0.0,
    }]);

    while let Some(QueueEntry { node: v, cost }) = heap.pop() {
        if settled[v] {
            continue;
        }
        settled[v] = true;
        order.push(v);

        for &(w, weight) in &graph.neighbors[v] {
            if settled[w] || weight == 0 {
                continue;
            }
            let next = cost + 1.0 / weight as f64;
            match dist[w] {
                Some(current) if (next - current).abs() <= PATH_EPSILON => {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
                Some(current) if next > current => {}
                _ => {
                    dist[w] = Some(next);
                    sigma[w] = sigma[v];
                    predecessors[w] = vec![v];
                    heap.push(QueueEntry { node: w, cost: next });
                }
            }
        }
    }

    SourcePass {
        order,
        predecessors,
        sigma,
        distance: dist,
    }
}

/// Reverse sweep: dependency of the source on every node it reached.
fn accumulate(pass: &SourcePass, source: usize, scores: &mut [f64]) {
    let mut delta = vec![0.0; scores.len()];
    for &w in pass.order.iter().rev() {
        if pass.sigma[w] == 0.0 {
            continue;
        }
        let coefficient = (1.0 + delta[w]) / pass.sigma[w];
        for &v in &pass.predecessors[w] {
            delta[v] += pass.sigma[v] * coefficient;
        }
        if w != source {
            scores[w] += delta[w];
        }
    }
}
