use crate::graph::EdgeKey;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What one `ingest_batch` call did, for the caller to persist and report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Batch sequence number, starting at 1.
    pub batch: u64,

    pub mentions_received: usize,

    /// Mentions with no alphanumeric content. Not resolved.
    pub mentions_skipped: usize,

    /// Mentions whose `(alias, document)` pair was already known.
    pub duplicate_mentions: usize,

    pub documents: usize,

    /// Canonical entities created by this batch.
    pub entities_created: usize,

    /// Mentions that hit an existing key.
    pub exact_matches: usize,

    /// Mentions folded into an existing entity by similarity.
    pub fuzzy_matches: usize,

    /// Low-confidence matches filed for review.
    pub suggestions: usize,

    /// Distinct canonical entities mentioned, in first-mention order.
    pub resolved_entities: Vec<EntityId>,

    /// Pairs that had no edge before this batch.
    pub new_edges: Vec<EdgeKey>,

    /// Existing edges that gained a supporting document.
    pub edges_updated: usize,

    pub nodes_added: usize,

    #[serde(with = "duration_millis")]
    pub duration: Duration,

    /// Live entities after the batch.
    pub total_entities: usize,

    /// Graph edges after the batch.
    pub total_edges: usize,
}

impl IngestSummary {
    pub fn edges_touched(&self) -> usize {
        self.new_edges.len() + self.edges_updated
    }

    /// Get a summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "Batch #{}: {} mentions over {} documents ({} skipped, {} duplicate), \
             {} new entities, {} exact, {} fuzzy, {} suggested, \
             {} new edges, {} updated in {:?} | Total: {} entities, {} edges",
            self.batch,
            self.mentions_received,
            self.documents,
            self.mentions_skipped,
            self.duplicate_mentions,
            self.entities_created,
            self.exact_matches,
            self.fuzzy_matches,
            self.suggestions,
            self.new_edges.len(),
            self.edges_updated,
            self.duration,
            self.total_entities,
            self.total_edges
        )
    }
}

/// Running totals across the engine's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    pub batches: u64,
    pub mentions: u64,
    pub documents: u64,
    pub entities_created: u64,
    pub fuzzy_matches: u64,
    pub suggestions: u64,
    pub edges_created: u64,
    pub merges: u64,
    pub splits: u64,
    pub ambiguous_splits: u64,
    pub analytics_runs: u64,

    #[serde(with = "duration_millis")]
    pub last_batch_duration: Duration,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_batch(&mut self, summary: &IngestSummary) {
        self.batches += 1;
        self.mentions += summary.mentions_received as u64;
        self.documents += summary.documents as u64;
        self.entities_created += summary.entities_created as u64;
        self.fuzzy_matches += summary.fuzzy_matches as u64;
        self.suggestions += summary.suggestions as u64;
        self.edges_created += summary.new_edges.len() as u64;
        self.last_batch_duration = summary.duration;
    }

    pub fn record_merge(&mut self) {
        self.merges += 1;
    }

    pub fn record_split(&mut self, ambiguous: bool) {
        self.splits += 1;
        if ambiguous {
            self.ambiguous_splits += 1;
        }
    }

    pub fn record_analytics(&mut self) {
        self.analytics_runs += 1;
    }
}

// Durations travel as whole milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
