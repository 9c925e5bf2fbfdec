use crate::analytics::{
    AnalyticsBudget, AnalyticsConfig, AnalyticsEngine, CentralityResult, ClosenessCentrality,
    Community, CommunityAssignment, DegreeCentrality, EigenvectorCentrality, GraphAnalytics,
};
use crate::error::{DossierError, Result};
use crate::graph::{CooccurrenceEdge, CooccurrenceGraph, GraphSnapshot, GraphStats, Neighbor, PathResult};
use crate::metrics::{IngestStats, IngestSummary};
use crate::normalize::NormalizerConfig;
use crate::resolver::{
    IdentityResolver, LogEntry, MergeOutcome, RescanOutcome, ResolutionOutcome, ResolverConfig, ReviewItem,
    SplitOutcome,
};
use crate::types::{CanonicalEntity, DocumentId, EntityId, EntityType, Mention};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use uuid::Uuid;

/// Config for the embedded engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DossierConfig {
    pub normalizer: NormalizerConfig,
    pub resolver: ResolverConfig,
    pub analytics: AnalyticsConfig,
    /// Re-check every structural invariant after each mutating call.
    /// Costs O(entities + edges) per call. Default: false.
    pub verify_invariants: bool,
}

impl DossierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_analytics(mut self, analytics: AnalyticsConfig) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_verify_invariants(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.normalizer.validate()?;
        self.resolver.validate()?;
        self.analytics.validate()?;
        Ok(())
    }
}

/// Both analytics result sets for one snapshot, plus context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub snapshot_version: u64,
    pub stats: GraphStats,
    /// Every node, ascending id order.
    pub centrality_results: Vec<CentralityResult>,
    /// Every node, ascending id order.
    pub community_assignments: Vec<CommunityAssignment>,
    /// Communities with at least `min_community_size` members, largest first.
    pub communities: Vec<Community>,
    pub modularity: f64,
    pub degree_centrality: Vec<DegreeCentrality>,
    /// Every node, ascending id order.
    pub closeness_centrality: Vec<ClosenessCentrality>,
    /// Every node, ascending id order. All zeros if the power iteration
    /// did not converge.
    pub eigenvector_centrality: Vec<EigenvectorCentrality>,
    pub elapsed_ms: u64,
}

impl AnalyticsReport {
    /// The `k` most central entities, highest score first.
    pub fn top_central(&self, k: usize) -> Vec<&CentralityResult> {
        let mut ranked: Vec<&CentralityResult> = self.centrality_results.iter().collect();
        ranked.sort_by(|a, b| {
            b.betweenness_score
                .total_cmp(&a.betweenness_score)
                .then(a.entity_id.cmp(&b.entity_id))
        });
        ranked.truncate(k);
        ranked
    }
}

struct EngineState {
    resolver: IdentityResolver,
    graph: CooccurrenceGraph,
    stats: IngestStats,
}

/// Entity resolution and co-occurrence engine, in-process.
///
/// All mutation goes through one write lock, so batches never interleave.
/// Analytics hold the read lock only long enough to take a snapshot.
///
/// # Example
/// ```rust
/// use dossier_core::{Dossier, DossierConfig, Mention, kinds::defaults};
///
/// let dossier = Dossier::new(DossierConfig::default()).unwrap();
/// dossier
///     .ingest_batch(&[
///         Mention::new("Jane Doe", defaults::person(), 1),
///         Mention::new("Acme Corp", defaults::organization(), 1),
///     ])
///     .unwrap();
/// let report = dossier.compute_analytics().unwrap();
/// assert_eq!(report.centrality_results.len(), 2);
/// ```
pub struct Dossier {
    state: RwLock<EngineState>,
    analytics: AnalyticsEngine,
    config: DossierConfig,
}

impl Dossier {
    pub fn new(config: DossierConfig) -> Result<Self> {
        config.validate()?;
        let resolver = IdentityResolver::new(&config.normalizer, config.resolver.clone())?;
        let analytics = AnalyticsEngine::new(config.analytics.clone())?;
        Ok(Self {
            state: RwLock::new(EngineState {
                resolver,
                graph: CooccurrenceGraph::new(),
                stats: IngestStats::new(),
            }),
            analytics,
            config,
        })
    }

    pub fn config(&self) -> &DossierConfig {
        &self.config
    }

    /// Resolve a batch of mentions and record one co-occurrence set per
    /// document, in order of first appearance.
    pub fn ingest_batch(&self, mentions: &[Mention]) -> Result<IngestSummary> {
        let started = Instant::now();
        let mut guard = self.write()?;
        let EngineState {
            resolver,
            graph,
            stats,
        } = &mut *guard;

        let mut summary = IngestSummary {
            batch: stats.batches + 1,
            mentions_received: mentions.len(),
            ..Default::default()
        };
        let mut documents: Vec<DocumentId> = Vec::new();
        let mut by_document: HashMap<DocumentId, Vec<EntityId>> = HashMap::new();
        let mut seen: HashSet<EntityId> = HashSet::new();

        for mention in mentions {
            if resolver
                .normalize(&mention.raw_text, &mention.entity_type)
                .is_empty()
            {
                summary.mentions_skipped += 1;
                continue;
            }
            let resolution =
                resolver.resolve_mention(&mention.raw_text, &mention.entity_type, mention.document_id);
            match resolution.outcome {
                ResolutionOutcome::Exact => summary.exact_matches += 1,
                ResolutionOutcome::Fuzzy { .. } => summary.fuzzy_matches += 1,
                ResolutionOutcome::Created => summary.entities_created += 1,
                ResolutionOutcome::Suggested { .. } => {
                    summary.entities_created += 1;
                    summary.suggestions += 1;
                }
            }
            if !resolution.new_mention {
                summary.duplicate_mentions += 1;
            }
            if seen.insert(resolution.entity_id) {
                summary.resolved_entities.push(resolution.entity_id);
            }
            by_document
                .entry(mention.document_id)
                .or_insert_with(|| {
                    documents.push(mention.document_id);
                    Vec::new()
                })
                .push(resolution.entity_id);
        }

        for document in &documents {
            let ids = by_document.remove(document).unwrap_or_default();
            let outcome = graph.record_document(ids, *document);
            summary.nodes_added += outcome.nodes_added;
            summary.edges_updated += outcome.edges_updated;
            summary.new_edges.extend(outcome.edges_created);
        }

        summary.documents = documents.len();
        summary.total_entities = resolver.len();
        summary.total_edges = graph.edge_count();
        summary.duration = started.elapsed();
        stats.record_batch(&summary);

        if self.config.verify_invariants {
            Self::verify_state(&guard)?;
        }
        log::info!("{}", summary.summary());
        Ok(summary)
    }

    /// Snapshot the graph and run every centrality measure and community
    /// detection on it.
    pub fn compute_analytics(&self) -> Result<AnalyticsReport> {
        self.compute_analytics_with(&AnalyticsBudget::unlimited())
    }

    /// `compute_analytics` under a deadline and/or cancel flag. Fails with
    /// `Timeout` or `Cancelled` rather than returning partial results.
    pub fn compute_analytics_with(&self, budget: &AnalyticsBudget) -> Result<AnalyticsReport> {
        let snapshot = self.snapshot()?;
        let started = Instant::now();

        let (core, (closeness, eigenvector)) = rayon::join(
            || self.analytics.run(&snapshot, budget),
            || {
                rayon::join(
                    || self.analytics.closeness(&snapshot, budget),
                    || self.analytics.eigenvector(&snapshot, budget),
                )
            },
        );
        let (centrality_results, partition) = core?;
        let closeness_centrality = closeness?;
        let eigenvector_centrality = eigenvector?;
        let degree_centrality = self.analytics.degree_centrality(&snapshot);
        let communities = partition
            .communities(self.config.analytics.min_community_size)
            .into_iter()
            .cloned()
            .collect();

        let report = AnalyticsReport {
            snapshot_version: snapshot.version(),
            stats: snapshot.stats(),
            centrality_results,
            community_assignments: partition.assignments,
            communities,
            modularity: partition.modularity,
            degree_centrality,
            closeness_centrality,
            eigenvector_centrality,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        self.write()?.stats.record_analytics();
        log::info!(
            "Analytics on snapshot v{}: {} nodes, {} edges, {} communities (Q = {:.4}) in {}ms",
            report.snapshot_version,
            report.stats.node_count,
            report.stats.edge_count,
            report.communities.len(),
            report.modularity,
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Read-consistent view of the current graph.
    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(self.read()?.graph.snapshot())
    }

    /// Snapshot restricted to the given entity types (all if empty) and to
    /// edges of at least `min_weight`. The stored graph is untouched.
    pub fn filtered_snapshot(&self, types: &[EntityType], min_weight: usize) -> Result<GraphSnapshot> {
        let (snapshot, allowed) = {
            let state = self.read()?;
            let snapshot = state.graph.snapshot();
            let allowed: HashSet<EntityId> = snapshot
                .nodes()
                .filter(|&id| {
                    types.is_empty()
                        || state
                            .resolver
                            .entity_type(id)
                            .is_ok_and(|t| types.contains(&t))
                })
                .collect();
            (snapshot, allowed)
        };
        Ok(snapshot.filtered(|id| allowed.contains(&id), min_weight))
    }

    pub fn lookup(&self, raw_text: &str, entity_type: &EntityType) -> Result<Option<EntityId>> {
        Ok(self.read()?.resolver.lookup(raw_text, entity_type))
    }

    pub fn canonical_id(&self, id: EntityId) -> Result<EntityId> {
        self.read()?.resolver.canonical_id(id)
    }

    pub fn entity(&self, id: EntityId) -> Result<CanonicalEntity> {
        self.read()?.resolver.entity(id)
    }

    pub fn entities(&self) -> Result<Vec<CanonicalEntity>> {
        Ok(self.read()?.resolver.entities())
    }

    pub fn entities_of_type(&self, entity_type: &EntityType) -> Result<Vec<CanonicalEntity>> {
        Ok(self.read()?.resolver.entities_of_type(entity_type))
    }

    /// The edge between two entities, following merge pointers.
    pub fn edge(&self, x: EntityId, y: EntityId) -> Result<Option<CooccurrenceEdge>> {
        let state = self.read()?;
        let x = state.resolver.canonical_id(x)?;
        let y = state.resolver.canonical_id(y)?;
        Ok(state.graph.edge(x, y).cloned())
    }

    /// Entities within `hops` of `id` over edges of at least `min_weight`.
    pub fn connections(&self, id: EntityId, hops: u32, min_weight: usize) -> Result<Vec<Neighbor>> {
        let id = self.canonical_id(id)?;
        Ok(self.snapshot()?.neighbors(id, hops, min_weight))
    }

    /// Strongest-tie path between two entities.
    pub fn path(&self, from: EntityId, to: EntityId) -> Result<Option<PathResult>> {
        let from = self.canonical_id(from)?;
        let to = self.canonical_id(to)?;
        Ok(self.snapshot()?.shortest_path(from, to))
    }

    /// Manually fold two entities together.
    pub fn merge(&self, a: EntityId, b: EntityId) -> Result<MergeOutcome> {
        let mut guard = self.write()?;
        let EngineState {
            resolver,
            graph,
            stats,
        } = &mut *guard;
        let outcome = resolver.merge(a, b, graph)?;
        if outcome.absorbed.is_some() {
            stats.record_merge();
        }
        if self.config.verify_invariants {
            Self::verify_state(&guard)?;
        }
        Ok(outcome)
    }

    /// Move the named aliases of an entity into a new entity.
    pub fn split<S: AsRef<str>>(&self, id: EntityId, aliases: &[S]) -> Result<SplitOutcome> {
        let mut guard = self.write()?;
        let EngineState {
            resolver,
            graph,
            stats,
        } = &mut *guard;
        let outcome = resolver.split(id, aliases, graph)?;
        stats.record_split(!outcome.is_exact());
        if self.config.verify_invariants {
            Self::verify_state(&guard)?;
        }
        Ok(outcome)
    }

    pub fn review_queue(&self) -> Result<Vec<ReviewItem>> {
        Ok(self
            .read()?
            .resolver
            .review_queue()
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn approve(&self, item: Uuid) -> Result<MergeOutcome> {
        let mut guard = self.write()?;
        let EngineState {
            resolver,
            graph,
            stats,
        } = &mut *guard;
        let outcome = resolver.approve(item, graph)?;
        if outcome.absorbed.is_some() {
            stats.record_merge();
        }
        if self.config.verify_invariants {
            Self::verify_state(&guard)?;
        }
        Ok(outcome)
    }

    /// Re-compare existing entities and file review items for look-alike
    /// pairs. Nothing is merged.
    pub fn rescan(&self, entity_type: Option<&EntityType>) -> Result<RescanOutcome> {
        Ok(self.write()?.resolver.rescan(entity_type))
    }

    /// `rescan` for a single entity.
    pub fn rescan_entity(&self, id: EntityId) -> Result<RescanOutcome> {
        self.write()?.resolver.rescan_entity(id)
    }

    pub fn reject(&self, item: Uuid) -> Result<ReviewItem> {
        self.write()?.resolver.reject(item)
    }

    pub fn resolution_log(&self) -> Result<Vec<LogEntry>> {
        Ok(self.read()?.resolver.resolution_log().entries().to_vec())
    }

    /// Drain the resolution log for persistence.
    pub fn take_log_entries(&self) -> Result<Vec<LogEntry>> {
        Ok(self.write()?.resolver.take_log_entries())
    }

    pub fn stats(&self) -> Result<IngestStats> {
        Ok(self.read()?.stats.clone())
    }

    /// Check graph, resolver and the links between them.
    pub fn verify_invariants(&self) -> Result<()> {
        let state = self.read()?;
        Self::verify_state(&state)
    }

    fn verify_state(state: &EngineState) -> Result<()> {
        let checked = state
            .graph
            .verify()
            .and_then(|_| state.resolver.verify())
            .and_then(|_| {
                match state.graph.nodes().find(|&id| !state.resolver.is_live(id)) {
                    Some(id) => Err(DossierError::InvariantViolation(format!(
                        "graph node {} is not a live entity",
                        id
                    ))),
                    None => Ok(()),
                }
            });
        if let Err(e) = &checked {
            log::error!("{}", e);
        }
        checked
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, EngineState>> {
        self.state
            .read()
            .map_err(|_| DossierError::Validation("Dossier state lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, EngineState>> {
        self.state
            .write()
            .map_err(|_| DossierError::Validation("Dossier state lock poisoned".into()))
    }
}
