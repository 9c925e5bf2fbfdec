pub mod types;
pub mod error;
pub mod kinds;
pub mod normalize;
pub mod resolver;
pub mod graph;
pub mod analytics;
pub mod metrics;
pub mod api;

pub use error::{DossierError, Result};
pub use types::*;
pub use api::{AnalyticsReport, Dossier, DossierConfig};
pub use normalize::{NormalizedKey, Normalizer, NormalizerConfig};
pub use resolver::{
    DisplayNamePolicy, IdentityResolver, LogAction, LogEntry, MatchStrategy, MergeOutcome,
    RescanOutcome, Resolution, ResolutionLog, ResolutionOutcome, ResolverConfig, ReviewItem, Similarity,
    SplitOutcome, SplitProvenance,
};
pub use graph::{
    CooccurrenceEdge, CooccurrenceGraph, EdgeKey, GraphSnapshot, GraphStats, Neighbor,
    PathResult,
};
pub use analytics::{
    AnalyticsBudget, AnalyticsConfig, AnalyticsEngine, CentralityResult, ClosenessCentrality,
    Community, CommunityAssignment, CommunityPartition, DegreeCentrality, EigenvectorCentrality,
    GraphAnalytics, PathCost,
};
pub use metrics::{IngestStats, IngestSummary};
