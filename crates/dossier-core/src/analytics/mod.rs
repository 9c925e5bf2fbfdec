//! Graph analytics over immutable snapshots
//!
//! Betweenness centrality (Brandes), greedy modularity communities,
//! closeness, eigenvector and degree centrality. Everything here is a pure function of a snapshot
//! and a configuration; nothing is cached between runs.

mod betweenness;
mod budget;
mod centrality;
mod community;
mod config;
mod degree;
mod indexed;

pub use betweenness::CentralityResult;
pub use budget::AnalyticsBudget;
pub use centrality::{ClosenessCentrality, EigenvectorCentrality};
pub use community::{modularity, Community, CommunityAssignment, CommunityPartition};
pub use config::{AnalyticsConfig, PathCost};
pub use degree::DegreeCentrality;

use crate::error::Result;
use crate::graph::GraphSnapshot;
use indexed::IndexedGraph;

/// Core analytics operations over a snapshot.
pub trait GraphAnalytics: Send + Sync {
    /// Betweenness for every node, ascending id order.
    fn betweenness(&self, snapshot: &GraphSnapshot, budget: &AnalyticsBudget) -> Result<Vec<CentralityResult>>;

    /// Flat community partition covering every node.
    fn communities(&self, snapshot: &GraphSnapshot, budget: &AnalyticsBudget) -> Result<CommunityPartition>;

    /// Closeness for every node, ascending id order.
    fn closeness(&self, snapshot: &GraphSnapshot, budget: &AnalyticsBudget) -> Result<Vec<ClosenessCentrality>>;

    /// Eigenvector centrality for every node, ascending id order. All
    /// zeros when the power iteration does not converge.
    fn eigenvector(&self, snapshot: &GraphSnapshot, budget: &AnalyticsBudget) -> Result<Vec<EigenvectorCentrality>>;

    /// Degree centrality for every node, ascending id order.
    fn degree_centrality(&self, snapshot: &GraphSnapshot) -> Vec<DegreeCentrality>;

    /// Betweenness and communities on the same snapshot, concurrently.
    /// Fails as a whole if either side fails.
    fn run(
        &self,
        snapshot: &GraphSnapshot,
        budget: &AnalyticsBudget,
    ) -> Result<(Vec<CentralityResult>, CommunityPartition)> {
        let (centrality, communities) = rayon::join(
            || self.betweenness(snapshot, budget),
            || self.communities(snapshot, budget),
        );
        Ok((centrality?, communities?))
    }
}

/// Default analytics engine.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }
}

impl GraphAnalytics for AnalyticsEngine {
    fn betweenness(&self, snapshot: &GraphSnapshot, budget: &AnalyticsBudget) -> Result<Vec<CentralityResult>> {
        let deadline = budget.clone().or_max_time(self.config.max_time).start();
        let graph = IndexedGraph::from_snapshot(snapshot);
        let result = betweenness::betweenness(&graph, &self.config, &deadline);
        match &result {
            Ok(_) => log::debug!(
                "Betweenness over {} nodes took {:?}",
                graph.len(),
                deadline.elapsed()
            ),
            Err(e) => log::warn!("Betweenness aborted on snapshot v{}: {}", snapshot.version(), e),
        }
        result
    }

    fn communities(&self, snapshot: &GraphSnapshot, budget: &AnalyticsBudget) -> Result<CommunityPartition> {
        let deadline = budget.clone().or_max_time(self.config.max_time).start();
        let graph = IndexedGraph::from_snapshot(snapshot);
        let result =
            community::greedy_modularity(&graph, snapshot, self.config.weighted_modularity, &deadline);
        match &result {
            Ok(partition) => log::debug!(
                "Found {} communities (Q = {:.4}) in {:?}",
                partition.len(),
                partition.modularity,
                deadline.elapsed()
            ),
            Err(e) => log::warn!("Community detection aborted on snapshot v{}: {}", snapshot.version(), e),
        }
        result
    }

    fn closeness(&self, snapshot: &GraphSnapshot, budget: &AnalyticsBudget) -> Result<Vec<ClosenessCentrality>> {
        let deadline = budget.clone().or_max_time(self.config.max_time).start();
        let graph = IndexedGraph::from_snapshot(snapshot);
        let result = centrality::closeness(&graph, &self.config, &deadline);
        if let Err(e) = &result {
            log::warn!("Closeness aborted on snapshot v{}: {}", snapshot.version(), e);
        }
        result
    }

    fn eigenvector(&self, snapshot: &GraphSnapshot, budget: &AnalyticsBudget) -> Result<Vec<EigenvectorCentrality>> {
        let deadline = budget.clone().or_max_time(self.config.max_time).start();
        let graph = IndexedGraph::from_snapshot(snapshot);
        let result = centrality::eigenvector(&graph, &self.config, &deadline);
        if let Err(e) = &result {
            log::warn!("Eigenvector centrality aborted on snapshot v{}: {}", snapshot.version(), e);
        }
        result
    }

    fn degree_centrality(&self, snapshot: &GraphSnapshot) -> Vec<DegreeCentrality> {
        degree::degree_centrality(&IndexedGraph::from_snapshot(snapshot))
    }
}
