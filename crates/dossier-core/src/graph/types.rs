use crate::types::{DocumentId, EntityId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Canonical unordered pair of entities. Always `a < b`; self-pairs
/// cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    a: EntityId,
    b: EntityId,
}

impl EdgeKey {
    /// Returns None for a self-pair.
    pub fn new(x: EntityId, y: EntityId) -> Option<Self> {
        match x.cmp(&y) {
            Ordering::Less => Some(Self { a: x, b: y }),
            Ordering::Greater => Some(Self { a: y, b: x }),
            Ordering::Equal => None,
        }
    }

    pub fn a(&self) -> EntityId {
        self.a
    }

    pub fn b(&self) -> EntityId {
        self.b
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.a == id || self.b == id
    }

    /// The endpoint opposite `id`, if `id` is an endpoint.
    pub fn other(&self, id: EntityId) -> Option<EntityId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Co-occurrence relationship between two canonical entities.
///
/// `weight` always equals `supporting_documents.len()`; the store is the
/// only writer and recomputes it on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooccurrenceEdge {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub weight: usize,
    pub supporting_documents: BTreeSet<DocumentId>,
}

impl CooccurrenceEdge {
    pub(crate) fn new(key: EdgeKey) -> Self {
        Self {
            entity_a: key.a,
            entity_b: key.b,
            weight: 0,
            supporting_documents: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            a: self.entity_a,
            b: self.entity_b,
        }
    }

    /// Returns true if the document was not already supporting the edge.
    pub(crate) fn add_document(&mut self, document: DocumentId) -> bool {
        let inserted = self.supporting_documents.insert(document);
        self.weight = self.supporting_documents.len();
        inserted
    }

    pub(crate) fn extend_documents<I: IntoIterator<Item = DocumentId>>(&mut self, documents: I) {
        self.supporting_documents.extend(documents);
        self.weight = self.supporting_documents.len();
    }

    pub(crate) fn set_documents(&mut self, documents: BTreeSet<DocumentId>) {
        self.supporting_documents = documents;
        self.weight = self.supporting_documents.len();
    }
}

/// What a single `record_document` call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub document: DocumentId,
    /// Nodes seen for the first time.
    pub nodes_added: usize,
    /// Pairs that had no edge before this document.
    pub edges_created: Vec<EdgeKey>,
    /// Existing edges that gained this document.
    pub edges_updated: usize,
}

impl RecordOutcome {
    pub fn edges_touched(&self) -> usize {
        self.edges_created.len() + self.edges_updated
    }
}

/// Edge bookkeeping performed by `apply_merge`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEdges {
    /// Edges re-pointed from the absorbed id to the survivor.
    pub rewritten: usize,
    /// Re-pointed edges that collided with an existing survivor edge and
    /// were unioned into it.
    pub combined: usize,
    /// Edges between the two merged entities, now self-pairs.
    pub dropped_self_pairs: usize,
}

/// Edge bookkeeping performed by `apply_split`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitEdges {
    /// Edges that moved entirely to the new entity.
    pub moved: usize,
    /// Edges that now exist on both entities.
    pub shared: usize,
    /// Whether an edge between the source and the new entity was created
    /// for documents mentioning both alias sets.
    pub linked: bool,
    /// Supporting documents traceable to neither alias set. Non-zero means
    /// the ambiguous policy was applied.
    pub unattributed_documents: usize,
}

impl SplitEdges {
    pub fn is_ambiguous(&self) -> bool {
        self.unattributed_documents > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_key_is_canonical() {
        let x = EntityId::new(7);
        let y = EntityId::new(2);
        let k1 = EdgeKey::new(x, y).unwrap();
        let k2 = EdgeKey::new(y, x).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(k1.a(), y);
        assert_eq!(k1.b(), x);
        assert_eq!(k1.other(x), Some(y));
        assert_eq!(k1.other(EntityId::new(99)), None);
        assert!(EdgeKey::new(x, x).is_none());
    }

    #[test]
    fn test_weight_tracks_documents() {
        let key = EdgeKey::new(EntityId::new(1), EntityId::new(2)).unwrap();
        let mut edge = CooccurrenceEdge::new(key);
        assert!(edge.add_document(10));
        assert!(!edge.add_document(10));
        edge.extend_documents([11, 12, 10]);
        assert_eq!(edge.weight, 3);
        edge.set_documents([5].into_iter().collect());
        assert_eq!(edge.weight, 1);
    }
}
