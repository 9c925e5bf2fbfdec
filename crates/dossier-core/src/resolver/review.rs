use crate::resolver::similarity::{MatchStrategy, Similarity};
use crate::types::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A suggested merge that scored below the auto-merge threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: Uuid,
    /// The entity created for the unmatched mention.
    pub source: EntityId,
    /// The existing entity it resembles.
    pub target: EntityId,
    pub confidence: f64,
    pub strategy: MatchStrategy,
    pub created_at: DateTime<Utc>,
}

impl ReviewItem {
    fn pair(&self) -> (EntityId, EntityId) {
        ordered(self.source, self.target)
    }
}

fn ordered(x: EntityId, y: EntityId) -> (EntityId, EntityId) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

/// Pending merge suggestions, at most one per unordered entity pair.
#[derive(Debug, Clone, Default)]
pub struct ReviewQueue {
    items: Vec<ReviewItem>,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// File a suggestion. Returns None for self-pairs and pairs already pending.
    pub fn enqueue(&mut self, source: EntityId, target: EntityId, similarity: Similarity) -> Option<Uuid> {
        if source == target {
            return None;
        }
        let pair = ordered(source, target);
        if self.items.iter().any(|item| item.pair() == pair) {
            return None;
        }
        let id = Uuid::now_v7();
        self.items.push(ReviewItem {
            id,
            source,
            target,
            confidence: similarity.score,
            strategy: similarity.strategy,
            created_at: Utc::now(),
        });
        Some(id)
    }

    pub fn get(&self, id: Uuid) -> Option<&ReviewItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Pending items, highest confidence first, then oldest first.
    pub fn pending(&self) -> Vec<&ReviewItem> {
        let mut items: Vec<&ReviewItem> = self.items.iter().collect();
        items.sort_by(|a, b| b.confidence.total_cmp(&a.confidence).then(a.id.cmp(&b.id)));
        items
    }

    pub fn take(&mut self, id: Uuid) -> Option<ReviewItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Re-point items after `absorbed` merged into `survivor`. Items that
    /// now pair an entity with itself are dropped, duplicates keep the
    /// higher confidence.
    pub fn remap(&mut self, absorbed: EntityId, survivor: EntityId) {
        for item in &mut self.items {
            if item.source == absorbed {
                item.source = survivor;
            }
            if item.target == absorbed {
                item.target = survivor;
            }
        }
        self.items.retain(|item| item.source != item.target);

        let mut kept: Vec<ReviewItem> = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            match kept.iter_mut().find(|k| k.pair() == item.pair()) {
                Some(existing) => {
                    if item.confidence > existing.confidence {
                        *existing = item;
                    }
                }
                None => kept.push(item),
            }
        }
        self.items = kept;
    }
}
