use crate::types::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single resolution decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    /// When this action occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub action: LogAction,
    /// The entity acted upon (the survivor, for merges).
    pub entity: EntityId,
    /// The other side of a merge, split or suggestion.
    pub related: Option<EntityId>,
    /// Structured details: scores, aliases, edge counts.
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Created,
    FuzzyMatched,
    Suggested,
    Merged,
    Split,
    Approved,
    Rejected,
}

impl std::fmt::Display for LogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogAction::Created => write!(f, "entity.created"),
            LogAction::FuzzyMatched => write!(f, "entity.fuzzy_matched"),
            LogAction::Suggested => write!(f, "review.suggested"),
            LogAction::Merged => write!(f, "entity.merged"),
            LogAction::Split => write!(f, "entity.split"),
            LogAction::Approved => write!(f, "review.approved"),
            LogAction::Rejected => write!(f, "review.rejected"),
        }
    }
}

/// Append-only in-memory log of resolution decisions. The storage layer
/// drains it with `take_entries` and persists the entries.
#[derive(Debug, Clone, Default)]
pub struct ResolutionLog {
    entries: Vec<LogEntry>,
}

impl ResolutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        action: LogAction,
        entity: EntityId,
        related: Option<EntityId>,
        details: Option<serde_json::Value>,
    ) -> Uuid {
        let id = Uuid::now_v7();
        self.entries.push(LogEntry {
            id,
            timestamp: Utc::now(),
            action,
            entity,
            related,
            details,
        });
        id
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries touching `entity` on either side.
    pub fn entries_for(&self, entity: EntityId) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.entity == entity || e.related == Some(entity))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hand over every entry recorded so far.
    pub fn take_entries(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.entries)
    }
}
