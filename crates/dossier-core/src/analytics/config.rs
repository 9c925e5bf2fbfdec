use crate::error::{DossierError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Path cost used by betweenness centrality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCost {
    /// Every edge costs one hop; edge weight is ignored.
    #[default]
    Unweighted,
    /// Edge cost is `1 / weight`, so frequent co-occurrence is a short hop.
    InverseWeight,
}

/// Configuration for the analytics engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Default: Unweighted.
    pub path_cost: PathCost,

    /// Scale betweenness by `(n - 1)(n - 2) / 2` over the whole snapshot.
    /// Default: true.
    pub normalized: bool,

    /// Use edge weights as modularity weights. Default: true.
    pub weighted_modularity: bool,

    /// Spread Brandes' per-source work over the rayon pool. Default: true.
    pub parallel: bool,

    /// Deadline for one analytics run. None = unbounded. A per-call
    /// budget overrides it.
    pub max_time: Option<Duration>,

    /// Smallest community reported in summaries. Assignments always
    /// cover every node. Default: 1.
    pub min_community_size: usize,

    /// Power-iteration rounds before eigenvector centrality gives up
    /// and reports zeros. Default: 1000.
    pub eigenvector_max_iter: usize,

    /// Per-node convergence tolerance for eigenvector centrality.
    /// Default: 1e-6.
    pub eigenvector_tolerance: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            path_cost: PathCost::Unweighted,
            normalized: true,
            weighted_modularity: true,
            parallel: true,
            max_time: None,
            min_community_size: 1,
            eigenvector_max_iter: 1000,
            eigenvector_tolerance: 1e-6,
        }
    }
}

impl AnalyticsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_cost(mut self, cost: PathCost) -> Self {
        self.path_cost = cost;
        self
    }

    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn with_weighted_modularity(mut self, weighted: bool) -> Self {
        self.weighted_modularity = weighted;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    pub fn with_min_community_size(mut self, size: usize) -> Self {
        self.min_community_size = size;
        self
    }

    pub fn with_eigenvector_max_iter(mut self, max_iter: usize) -> Self {
        self.eigenvector_max_iter = max_iter;
        self
    }

    pub fn with_eigenvector_tolerance(mut self, tolerance: f64) -> Self {
        self.eigenvector_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_community_size == 0 {
            return Err(DossierError::Validation(
                "min_community_size must be > 0".into(),
            ));
        }
        if self.eigenvector_max_iter == 0 {
            return Err(DossierError::Validation(
                "eigenvector_max_iter must be > 0".into(),
            ));
        }
        if self.eigenvector_tolerance.is_nan() || self.eigenvector_tolerance <= 0.0 {
            return Err(DossierError::Validation(
                "eigenvector_tolerance must be > 0".into(),
            ));
        }
        if self.max_time.is_some_and(|t| t.is_zero()) {
            return Err(DossierError::Validation(
                "max_time must be > 0 when set".into(),
            ));
        }
        Ok(())
    }
}
