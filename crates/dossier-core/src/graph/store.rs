use crate::error::{DossierError, Result};
use crate::graph::snapshot::GraphSnapshot;
use crate::graph::types::{CooccurrenceEdge, EdgeKey, MergeEdges, RecordOutcome, SplitEdges};
use crate::types::{DocumentId, EntityId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Incrementally maintained co-occurrence graph over canonical entities.
///
/// Node and edge collections sit behind `Arc` and are mutated through
/// `Arc::make_mut`: taking a snapshot is a pointer copy, and the first
/// write after a snapshot pays for one clone of the collection. The
/// adjacency index is private to the store and never shared.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceGraph {
    nodes: Arc<BTreeSet<EntityId>>,
    edges: Arc<BTreeMap<EdgeKey, CooccurrenceEdge>>,
    adjacency: HashMap<EntityId, BTreeSet<EntityId>>,
    version: u64,
}

impl CooccurrenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic counter bumped by every mutation that changed the graph.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, id: EntityId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = &CooccurrenceEdge> {
        self.edges.values()
    }

    pub fn edge(&self, x: EntityId, y: EntityId) -> Option<&CooccurrenceEdge> {
        EdgeKey::new(x, y).and_then(|key| self.edges.get(&key))
    }

    /// Neighbours of a node in ascending id order.
    pub fn neighbors(&self, id: EntityId) -> Vec<EntityId> {
        self.adjacency
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn degree(&self, id: EntityId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeSet::len)
    }

    /// Register an entity as a node without any edge. Returns true if new.
    pub fn add_node(&mut self, id: EntityId) -> bool {
        if self.nodes.contains(&id) {
            return false;
        }
        Arc::make_mut(&mut self.nodes).insert(id);
        self.version += 1;
        true
    }

    /// Record that every entity in `entity_ids` was mentioned in `document`.
    ///
    /// Each unordered pair gains `document` as a supporting document.
    /// Self-pairs and duplicate ids are ignored. Re-recording the same
    /// document is a no-op: supporting documents are a set.
    pub fn record_document<I>(&mut self, entity_ids: I, document: DocumentId) -> RecordOutcome
    where
        I: IntoIterator<Item = EntityId>,
    {
        let ids: BTreeSet<EntityId> = entity_ids.into_iter().collect();
        let mut outcome = RecordOutcome {
            document,
            ..Default::default()
        };

        for &id in &ids {
            if self.add_node(id) {
                outcome.nodes_added += 1;
            }
        }

        let ids: Vec<EntityId> = ids.into_iter().collect();
        let mut changed = false;
        for (i, &x) in ids.iter().enumerate() {
            for &y in &ids[i + 1..] {
                let Some(key) = EdgeKey::new(x, y) else {
                    continue;
                };
                let edges = Arc::make_mut(&mut self.edges);
                match edges.get_mut(&key) {
                    Some(edge) => {
                        if edge.add_document(document) {
                            outcome.edges_updated += 1;
                            changed = true;
                        }
                    }
                    None => {
                        let mut edge = CooccurrenceEdge::new(key);
                        edge.add_document(document);
                        edges.insert(key, edge);
                        self.link(x, y);
                        outcome.edges_created.push(key);
                        changed = true;
                    }
                }
            }
        }

        if changed {
            self.version += 1;
        }
        outcome
    }

    /// Rewrite every edge of `absorbed` onto `survivor`.
    ///
    /// Colliding edges are unioned, so no pair ever has two edges. The
    /// edge between the two merged entities (if any) disappears with the
    /// absorbed node. Cost is O(degree(absorbed) · log E).
    pub fn apply_merge(&mut self, absorbed: EntityId, survivor: EntityId) -> MergeEdges {
        let mut outcome = MergeEdges::default();
        if absorbed == survivor || !self.nodes.contains(&absorbed) {
            return outcome;
        }

        let neighbors = self.adjacency.remove(&absorbed).unwrap_or_default();
        let edges = Arc::make_mut(&mut self.edges);

        for neighbor in neighbors {
            if let Some(set) = self.adjacency.get_mut(&neighbor) {
                set.remove(&absorbed);
            }
            let Some(old_key) = EdgeKey::new(absorbed, neighbor) else {
                continue;
            };
            let Some(old_edge) = edges.remove(&old_key) else {
                continue;
            };
            if neighbor == survivor {
                outcome.dropped_self_pairs += 1;
                continue;
            }
            let Some(new_key) = EdgeKey::new(survivor, neighbor) else {
                continue;
            };
            match edges.get_mut(&new_key) {
                Some(existing) => {
                    existing.extend_documents(old_edge.supporting_documents);
                    outcome.combined += 1;
                }
                None => {
                    let mut edge = CooccurrenceEdge::new(new_key);
                    edge.set_documents(old_edge.supporting_documents);
                    edges.insert(new_key, edge);
                    outcome.rewritten += 1;
                }
            }
            self.adjacency.entry(survivor).or_default().insert(neighbor);
            self.adjacency.entry(neighbor).or_default().insert(survivor);
        }

        let nodes = Arc::make_mut(&mut self.nodes);
        nodes.remove(&absorbed);
        nodes.insert(survivor);
        self.version += 1;
        outcome
    }

    /// Move the edges of `source` that are carried by `extracted` documents
    /// onto the freshly split entity `target`.
    ///
    /// Documents only in `extracted` move, documents in both sets stay on
    /// both entities, and documents in both sets also link `source` and
    /// `target`. If any supporting document is in neither set, nothing can
    /// be attributed safely: `target` receives a copy of every edge and
    /// `source` keeps all of its own.
    pub fn apply_split(
        &mut self,
        source: EntityId,
        target: EntityId,
        extracted: &BTreeSet<DocumentId>,
        retained: &BTreeSet<DocumentId>,
    ) -> SplitEdges {
        let mut outcome = SplitEdges::default();
        if source == target || !self.nodes.contains(&source) {
            return outcome;
        }
        self.add_node(target);

        let neighbors: Vec<EntityId> = self.neighbors(source);
        let mut unattributed = BTreeSet::new();
        for &neighbor in &neighbors {
            if let Some(edge) = self.edge(source, neighbor) {
                unattributed.extend(
                    edge.supporting_documents
                        .iter()
                        .filter(|d| !extracted.contains(*d) && !retained.contains(*d))
                        .copied(),
                );
            }
        }
        outcome.unattributed_documents = unattributed.len();

        for neighbor in neighbors {
            let (Some(old_key), Some(new_key)) =
                (EdgeKey::new(source, neighbor), EdgeKey::new(target, neighbor))
            else {
                continue;
            };
            let Some(documents) = self
                .edges
                .get(&old_key)
                .map(|e| e.supporting_documents.clone())
            else {
                continue;
            };

            let (to_target, to_source) = if outcome.is_ambiguous() {
                (documents.clone(), documents)
            } else {
                let to_target: BTreeSet<_> = documents.intersection(extracted).copied().collect();
                let to_source: BTreeSet<_> = documents.intersection(retained).copied().collect();
                (to_target, to_source)
            };

            let edges = Arc::make_mut(&mut self.edges);
            if !to_target.is_empty() {
                edges
                    .entry(new_key)
                    .or_insert_with(|| CooccurrenceEdge::new(new_key))
                    .extend_documents(to_target.iter().copied());
                self.adjacency.entry(target).or_default().insert(neighbor);
                self.adjacency.entry(neighbor).or_default().insert(target);
            }

            if to_source.is_empty() {
                edges.remove(&old_key);
                self.unlink(source, neighbor);
                outcome.moved += 1;
            } else {
                if let Some(edge) = edges.get_mut(&old_key) {
                    edge.set_documents(to_source);
                }
                if !to_target.is_empty() {
                    outcome.shared += 1;
                }
            }
        }

        let both: BTreeSet<DocumentId> = extracted.intersection(retained).copied().collect();
        if !both.is_empty() {
            if let Some(key) = EdgeKey::new(source, target) {
                Arc::make_mut(&mut self.edges)
                    .entry(key)
                    .or_insert_with(|| CooccurrenceEdge::new(key))
                    .extend_documents(both);
                self.link(source, target);
                outcome.linked = true;
            }
        }

        self.version += 1;
        outcome
    }

    /// Read-consistent view for analytics. O(1): shares the current
    /// collections, later writes copy before mutating.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::new(self.version, Arc::clone(&self.nodes), Arc::clone(&self.edges))
    }

    /// Check the store's structural invariants.
    pub fn verify(&self) -> Result<()> {
        let mut adjacency_entries = 0;
        for (key, edge) in self.edges.iter() {
            if edge.key() != *key || edge.entity_a >= edge.entity_b {
                return Err(DossierError::InvariantViolation(format!(
                    "edge stored under {:?} has endpoints {} / {}",
                    key, edge.entity_a, edge.entity_b
                )));
            }
            if edge.weight != edge.supporting_documents.len() || edge.weight == 0 {
                return Err(DossierError::InvariantViolation(format!(
                    "edge {}-{} has weight {} but {} supporting documents",
                    edge.entity_a,
                    edge.entity_b,
                    edge.weight,
                    edge.supporting_documents.len()
                )));
            }
            for endpoint in [edge.entity_a, edge.entity_b] {
                if !self.nodes.contains(&endpoint) {
                    return Err(DossierError::InvariantViolation(format!(
                        "edge {}-{} references missing node {}",
                        edge.entity_a, edge.entity_b, endpoint
                    )));
                }
            }
            let linked = self
                .adjacency
                .get(&edge.entity_a)
                .is_some_and(|s| s.contains(&edge.entity_b))
                && self
                    .adjacency
                    .get(&edge.entity_b)
                    .is_some_and(|s| s.contains(&edge.entity_a));
            if !linked {
                return Err(DossierError::InvariantViolation(format!(
                    "edge {}-{} missing from adjacency index",
                    edge.entity_a, edge.entity_b
                )));
            }
            adjacency_entries += 2;
        }

        let indexed: usize = self.adjacency.values().map(BTreeSet::len).sum();
        if indexed != adjacency_entries {
            return Err(DossierError::InvariantViolation(format!(
                "adjacency index holds {} entries for {} edges",
                indexed,
                self.edges.len()
            )));
        }
        Ok(())
    }

    fn link(&mut self, x: EntityId, y: EntityId) {
        self.adjacency.entry(x).or_default().insert(y);
        self.adjacency.entry(y).or_default().insert(x);
    }

    fn unlink(&mut self, x: EntityId, y: EntityId) {
        if let Some(set) = self.adjacency.get_mut(&x) {
            set.remove(&y);
        }
        if let Some(set) = self.adjacency.get_mut(&y) {
            set.remove(&x);
        }
    }
}
