use crate::error::{DossierError, Result};
use crate::graph::{CooccurrenceGraph, MergeEdges, SplitEdges};
use crate::normalize::{NormalizedKey, Normalizer, NormalizerConfig};
use crate::resolver::audit::{LogAction, LogEntry, ResolutionLog};
use crate::resolver::config::ResolverConfig;
use crate::resolver::record::{EntityRecord, Sighting};
use crate::resolver::review::{ReviewItem, ReviewQueue};
use crate::resolver::similarity::{self, Similarity};
use crate::types::{CanonicalEntity, DocumentId, EntityId, EntityType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// How a mention found its entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// The normalized key was already known.
    Exact,
    /// Joined an existing entity through a similarity match.
    Fuzzy { similarity: Similarity },
    /// No candidate cleared the suggestion threshold.
    Created,
    /// A new entity was created and a merge with `candidate` was filed
    /// for review.
    Suggested {
        candidate: EntityId,
        similarity: Similarity,
        review_item: Uuid,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub entity_id: EntityId,
    pub key: NormalizedKey,
    pub outcome: ResolutionOutcome,
    /// False when this `(alias, document)` pair had been recorded before.
    pub new_mention: bool,
}

impl Resolution {
    pub fn created_entity(&self) -> bool {
        matches!(
            self.outcome,
            ResolutionOutcome::Created | ResolutionOutcome::Suggested { .. }
        )
    }

    pub fn is_fuzzy(&self) -> bool {
        matches!(self.outcome, ResolutionOutcome::Fuzzy { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub survivor: EntityId,
    /// None when both ids already resolved to the same entity.
    pub absorbed: Option<EntityId>,
    pub edges: MergeEdges,
}

/// Whether a split could attribute every edge document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitProvenance {
    Exact,
    /// Both entities kept the full document set and are flagged
    /// `split_ambiguous`.
    Insufficient { unattributed_documents: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOutcome {
    pub source: EntityId,
    pub new_entity: EntityId,
    pub extracted_aliases: Vec<String>,
    pub edges: SplitEdges,
    pub provenance: SplitProvenance,
}

impl SplitOutcome {
    pub fn is_exact(&self) -> bool {
        self.provenance == SplitProvenance::Exact
    }

    /// The new entity id, or `InsufficientProvenance` if the split fell
    /// back to the ambiguous policy. The split has happened either way.
    pub fn into_exact(self) -> Result<EntityId> {
        match self.provenance {
            SplitProvenance::Exact => Ok(self.new_entity),
            SplitProvenance::Insufficient {
                unattributed_documents,
            } => Err(DossierError::InsufficientProvenance {
                entity: self.source,
                new_entity: self.new_entity,
                unattributed_documents,
            }),
        }
    }
}

/// Result of re-comparing existing entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RescanOutcome {
    pub entities_scanned: usize,
    /// Review items filed by this rescan, in pair order.
    pub review_items: Vec<Uuid>,
}

#[derive(Debug, Clone)]
enum Slot {
    Live(EntityRecord),
    /// Permanent pointer left behind by a merge.
    Absorbed(EntityId),
}

/// Maps normalized mention keys to canonical entities.
///
/// Entities live in an arena indexed by id ordinal. A merge turns the
/// absorbed slot into a pointer at the survivor, so old ids keep
/// resolving and are never handed out again.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    config: ResolverConfig,
    normalizer: Normalizer,
    slots: Vec<Slot>,
    key_index: HashMap<NormalizedKey, EntityId>,
    by_type: HashMap<EntityType, BTreeSet<EntityId>>,
    review: ReviewQueue,
    log: ResolutionLog,
    sequence: u64,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::with_parts(Normalizer::default(), ResolverConfig::default())
    }
}

impl IdentityResolver {
    pub fn new(normalizer: &NormalizerConfig, config: ResolverConfig) -> Result<Self> {
        normalizer.validate()?;
        config.validate()?;
        Ok(Self::with_parts(Normalizer::new(normalizer), config))
    }

    fn with_parts(normalizer: Normalizer, config: ResolverConfig) -> Self {
        Self {
            config,
            normalizer,
            slots: Vec::new(),
            key_index: HashMap::new(),
            by_type: HashMap::new(),
            review: ReviewQueue::new(),
            log: ResolutionLog::new(),
            sequence: 0,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn normalize(&self, raw_text: &str, entity_type: &EntityType) -> NormalizedKey {
        self.normalizer.normalize(raw_text, entity_type)
    }

    /// Number of live canonical entities.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a mention to its canonical entity. Never fails: anything
    /// that cannot be matched confidently becomes a new entity.
    pub fn resolve(&mut self, raw_text: &str, entity_type: &EntityType, document_id: DocumentId) -> EntityId {
        self.resolve_mention(raw_text, entity_type, document_id).entity_id
    }

    /// `resolve`, reporting how the entity was found.
    pub fn resolve_mention(
        &mut self,
        raw_text: &str,
        entity_type: &EntityType,
        document_id: DocumentId,
    ) -> Resolution {
        let key = self.normalizer.normalize(raw_text, entity_type);
        let surface = surface_form(raw_text);
        self.sequence += 1;
        let sighting = Sighting {
            seq: self.sequence,
            document: document_id,
        };

        if let Some(id) = self.indexed(&key) {
            if let Some(record) = self.live_mut(id) {
                let new_mention = record.record_sighting(&surface, &key, sighting);
                return Resolution {
                    entity_id: id,
                    key,
                    outcome: ResolutionOutcome::Exact,
                    new_mention,
                };
            }
        }

        let candidate = if self.config.fuzzy_enabled && !key.is_empty() {
            self.best_candidate(&key, document_id)
        } else {
            None
        };

        if let Some((target, matched)) = candidate {
            if matched.score >= self.config.auto_merge_threshold {
                if let Some(record) = self.live_mut(target) {
                    let new_mention = record.record_sighting(&surface, &key, sighting);
                    self.key_index.insert(key.clone(), target);
                    log::debug!(
                        "Fuzzy match '{}' -> {} ({} {:.2})",
                        surface,
                        target,
                        matched.strategy,
                        matched.score
                    );
                    self.log.record(
                        LogAction::FuzzyMatched,
                        target,
                        None,
                        Some(json!({
                            "alias": surface,
                            "score": matched.score,
                            "strategy": matched.strategy.to_string(),
                        })),
                    );
                    return Resolution {
                        entity_id: target,
                        key,
                        outcome: ResolutionOutcome::Fuzzy { similarity: matched },
                        new_mention,
                    };
                }
            }
        }

        let entity_id = self.create(&surface, &key, sighting);

        if let Some((target, matched)) = candidate {
            if let Some(review_item) = self.review.enqueue(entity_id, target, matched) {
                self.log.record(
                    LogAction::Suggested,
                    entity_id,
                    Some(target),
                    Some(json!({
                        "review_item": review_item.to_string(),
                        "score": matched.score,
                        "strategy": matched.strategy.to_string(),
                    })),
                );
                return Resolution {
                    entity_id,
                    key,
                    outcome: ResolutionOutcome::Suggested {
                        candidate: target,
                        similarity: matched,
                        review_item,
                    },
                    new_mention: true,
                };
            }
        }

        Resolution {
            entity_id,
            key,
            outcome: ResolutionOutcome::Created,
            new_mention: true,
        }
    }

    /// Resolve without mutating: exact key lookup, following merge pointers.
    pub fn lookup(&self, raw_text: &str, entity_type: &EntityType) -> Option<EntityId> {
        self.indexed(&self.normalizer.normalize(raw_text, entity_type))
    }

    /// Follow merge pointers to the live entity an id stands for.
    pub fn canonical_id(&self, id: EntityId) -> Result<EntityId> {
        let mut current = id;
        for _ in 0..=self.slots.len() {
            match self.slots.get(current.ordinal() as usize) {
                Some(Slot::Live(_)) => return Ok(current),
                Some(Slot::Absorbed(next)) => current = *next,
                None if current == id => return Err(DossierError::NotFound(id)),
                None => {
                    return Err(DossierError::InvariantViolation(format!(
                        "{} points at unallocated {}",
                        id, current
                    )))
                }
            }
        }
        Err(DossierError::InvariantViolation(format!(
            "merge pointers from {} form a cycle",
            id
        )))
    }

    pub fn entity(&self, id: EntityId) -> Result<CanonicalEntity> {
        Ok(self.record(id)?.to_entity(self.config.display_name))
    }

    /// Live entities in ascending id order.
    pub fn entities(&self) -> Vec<CanonicalEntity> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Live(record) => Some(record.to_entity(self.config.display_name)),
                Slot::Absorbed(_) => None,
            })
            .collect()
    }

    pub fn entities_of_type(&self, entity_type: &EntityType) -> Vec<CanonicalEntity> {
        self.by_type
            .get(entity_type)
            .into_iter()
            .flatten()
            .filter_map(|&id| self.live(id))
            .map(|record| record.to_entity(self.config.display_name))
            .collect()
    }

    pub fn entity_type(&self, id: EntityId) -> Result<EntityType> {
        Ok(self.record(id)?.entity_type.clone())
    }

    pub fn aliases(&self, id: EntityId) -> Result<Vec<String>> {
        Ok(self.record(id)?.surfaces().into_iter().collect())
    }

    /// True for ids that name a live entity rather than a merge pointer.
    pub fn is_live(&self, id: EntityId) -> bool {
        self.live(id).is_some()
    }

    /// Fold two entities into one. The one with more mentions survives,
    /// ties go to the lower id. Graph edges follow the absorbed entity.
    pub fn merge(&mut self, a: EntityId, b: EntityId, graph: &mut CooccurrenceGraph) -> Result<MergeOutcome> {
        let a = self.canonical_id(a)?;
        let b = self.canonical_id(b)?;
        if a == b {
            return Ok(MergeOutcome {
                survivor: a,
                absorbed: None,
                edges: MergeEdges::default(),
            });
        }

        let count_a = self.record(a)?.mention_count();
        let count_b = self.record(b)?.mention_count();
        let (survivor, absorbed) = if count_a > count_b || (count_a == count_b && a < b) {
            (a, b)
        } else {
            (b, a)
        };

        let slot = self
            .slots
            .get_mut(absorbed.ordinal() as usize)
            .ok_or(DossierError::NotFound(absorbed))?;
        let Slot::Live(record) = std::mem::replace(slot, Slot::Absorbed(survivor)) else {
            return Err(DossierError::InvariantViolation(format!(
                "{} resolved as canonical but is a merge pointer",
                absorbed
            )));
        };

        for key in record.keys() {
            self.key_index.insert(key.clone(), survivor);
        }
        for old in &record.absorbed_ids {
            if let Some(slot) = self.slots.get_mut(old.ordinal() as usize) {
                *slot = Slot::Absorbed(survivor);
            }
        }
        if let Some(ids) = self.by_type.get_mut(&record.entity_type) {
            ids.remove(&absorbed);
        }

        let aliases_moved = record.aliases.len();
        self.live_mut(survivor)
            .ok_or_else(|| {
                DossierError::InvariantViolation(format!("merge survivor {} is not live", survivor))
            })?
            .absorb(record);

        let edges = graph.apply_merge(absorbed, survivor);
        self.review.remap(absorbed, survivor);

        log::debug!(
            "Merged {} into {}: {} aliases, {} edges rewritten, {} combined",
            absorbed,
            survivor,
            aliases_moved,
            edges.rewritten,
            edges.combined
        );
        self.log.record(
            LogAction::Merged,
            survivor,
            Some(absorbed),
            Some(json!({
                "aliases_moved": aliases_moved,
                "edges_rewritten": edges.rewritten,
                "edges_combined": edges.combined,
                "self_pairs_dropped": edges.dropped_self_pairs,
            })),
        );

        Ok(MergeOutcome {
            survivor,
            absorbed: Some(absorbed),
            edges,
        })
    }

    /// Move the named aliases out of an entity into a new one.
    ///
    /// A requested string selects an alias key when it equals a surface
    /// form carrying that key, normalizes to the key, or names the key as
    /// `type:text` (needed after a merge across types, where one spelling
    /// carries a key per type). Every alias sharing a selected key goes
    /// with it. The new entity takes the type of the extracted keys when
    /// they agree. Edge documents follow the alias provenance. When some
    /// edge document cannot be attributed, both entities keep everything
    /// and are flagged `split_ambiguous` (see `SplitOutcome::into_exact`).
    pub fn split<S: AsRef<str>>(
        &mut self,
        id: EntityId,
        aliases: &[S],
        graph: &mut CooccurrenceGraph,
    ) -> Result<SplitOutcome> {
        let source = self.canonical_id(id)?;
        let record = self.record(source)?;

        let selected: BTreeSet<NormalizedKey> = record
            .aliases
            .keys()
            .filter(|(surface, key)| {
                aliases.iter().any(|requested| {
                    let requested = requested.as_ref();
                    surface.as_str() == surface_form(requested)
                        || self.normalizer.normalize(requested, &key.entity_type) == *key
                        || requested.trim() == key.to_string()
                })
            })
            .map(|(_, key)| key.clone())
            .collect();

        if selected.is_empty() {
            return Err(DossierError::Validation(format!(
                "none of the requested aliases belong to {}",
                source
            )));
        }
        if selected.len() == record.keys().len() {
            return Err(DossierError::Validation(format!(
                "cannot split every alias out of {}",
                source
            )));
        }

        let types: BTreeSet<&EntityType> = selected.iter().map(|key| &key.entity_type).collect();
        let entity_type = match types.into_iter().collect::<Vec<_>>().as_slice() {
            [only] => (*only).clone(),
            _ => record.entity_type.clone(),
        };

        let new_entity = EntityId::new(self.slots.len() as u64);
        let source_record = self.live_mut(source).ok_or(DossierError::NotFound(source))?;
        let extracted = source_record.extract(&selected);
        let retained_documents = source_record.documents();
        let extracted_documents: BTreeSet<DocumentId> = extracted
            .values()
            .flat_map(|alias| alias.documents.iter().copied())
            .collect();

        let mut record = EntityRecord::new(new_entity, entity_type.clone());
        record.aliases = extracted;
        let extracted_aliases: Vec<String> = record.surfaces().into_iter().collect();
        for key in &selected {
            self.key_index.insert(key.clone(), new_entity);
        }
        self.slots.push(Slot::Live(record));
        self.by_type.entry(entity_type).or_default().insert(new_entity);

        let edges = graph.apply_split(source, new_entity, &extracted_documents, &retained_documents);
        let provenance = if edges.is_ambiguous() {
            for entity in [source, new_entity] {
                if let Some(record) = self.live_mut(entity) {
                    record.split_ambiguous = true;
                }
            }
            log::warn!(
                "Split of {} into {} is ambiguous: {} document(s) not attributable, both keep all edges",
                source,
                new_entity,
                edges.unattributed_documents
            );
            SplitProvenance::Insufficient {
                unattributed_documents: edges.unattributed_documents,
            }
        } else {
            log::debug!(
                "Split {} aliases from {} into {}: {} edges moved, {} shared",
                extracted_aliases.len(),
                source,
                new_entity,
                edges.moved,
                edges.shared
            );
            SplitProvenance::Exact
        };

        self.log.record(
            LogAction::Split,
            source,
            Some(new_entity),
            Some(json!({
                "aliases": extracted_aliases,
                "edges_moved": edges.moved,
                "edges_shared": edges.shared,
                "unattributed_documents": edges.unattributed_documents,
            })),
        );

        Ok(SplitOutcome {
            source,
            new_entity,
            extracted_aliases,
            edges,
            provenance,
        })
    }

    /// Compare every pair of live entities of `entity_type` (all types if
    /// None) and file a review item for each pair at or above the
    /// suggestion threshold. Catches pairs that only look alike after a
    /// config change or a merge brought in new aliases.
    ///
    /// Never merges, whatever the score, and runs even when fuzzy
    /// matching is disabled for ingest. Pairs already pending are skipped.
    pub fn rescan(&mut self, entity_type: Option<&EntityType>) -> RescanOutcome {
        let mut groups: Vec<(EntityType, Vec<EntityId>)> = self
            .by_type
            .iter()
            .filter(|(t, _)| entity_type.map_or(true, |wanted| wanted == *t))
            .map(|(t, ids)| (t.clone(), ids.iter().copied().collect()))
            .collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));

        let mut outcome = RescanOutcome::default();
        for (_, ids) in groups {
            outcome.entities_scanned += ids.len();
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    if let Some(item) = self.suggest_pair(a, b) {
                        outcome.review_items.push(item);
                    }
                }
            }
        }
        log::info!(
            "Rescan over {} entities filed {} review items",
            outcome.entities_scanned,
            outcome.review_items.len()
        );
        outcome
    }

    /// `rescan` for one entity against every other live entity of its type.
    pub fn rescan_entity(&mut self, id: EntityId) -> Result<RescanOutcome> {
        let id = self.canonical_id(id)?;
        let entity_type = self.record(id)?.entity_type.clone();
        let others: Vec<EntityId> = self
            .by_type
            .get(&entity_type)
            .map(|ids| ids.iter().copied().filter(|&other| other != id).collect())
            .unwrap_or_default();

        let mut outcome = RescanOutcome {
            entities_scanned: others.len() + 1,
            review_items: Vec::new(),
        };
        for other in others {
            if let Some(item) = self.suggest_pair(id, other) {
                outcome.review_items.push(item);
            }
        }
        Ok(outcome)
    }

    /// Pending merge suggestions, most confident first.
    pub fn review_queue(&self) -> Vec<&ReviewItem> {
        self.review.pending()
    }

    /// Accept a suggestion: merge its two entities.
    pub fn approve(&mut self, item: Uuid, graph: &mut CooccurrenceGraph) -> Result<MergeOutcome> {
        let review = self
            .review
            .get(item)
            .cloned()
            .ok_or(DossierError::ReviewItemNotFound(item))?;
        let outcome = self.merge(review.source, review.target, graph)?;
        self.review.take(item);
        self.log.record(
            LogAction::Approved,
            outcome.survivor,
            outcome.absorbed,
            Some(json!({ "review_item": item.to_string(), "confidence": review.confidence })),
        );
        Ok(outcome)
    }

    /// Discard a suggestion; both entities stay separate.
    pub fn reject(&mut self, item: Uuid) -> Result<ReviewItem> {
        let review = self
            .review
            .take(item)
            .ok_or(DossierError::ReviewItemNotFound(item))?;
        self.log.record(
            LogAction::Rejected,
            review.source,
            Some(review.target),
            Some(json!({ "review_item": item.to_string(), "confidence": review.confidence })),
        );
        Ok(review)
    }

    pub fn resolution_log(&self) -> &ResolutionLog {
        &self.log
    }

    pub fn take_log_entries(&mut self) -> Vec<LogEntry> {
        self.log.take_entries()
    }

    /// Check that every key and pointer leads to a live entity that owns it.
    pub fn verify(&self) -> Result<()> {
        for (index, slot) in self.slots.iter().enumerate() {
            let id = EntityId::new(index as u64);
            match slot {
                Slot::Live(record) => {
                    if record.id != id {
                        return Err(DossierError::InvariantViolation(format!(
                            "slot {} holds record for {}",
                            index, record.id
                        )));
                    }
                    if record.aliases.is_empty() {
                        return Err(DossierError::InvariantViolation(format!(
                            "{} has no aliases",
                            id
                        )));
                    }
                    for key in record.keys() {
                        let owner = self.indexed(key);
                        if owner != Some(id) {
                            return Err(DossierError::InvariantViolation(format!(
                                "key '{}' of {} resolves to {:?}",
                                key, id, owner
                            )));
                        }
                    }
                    if !self
                        .by_type
                        .get(&record.entity_type)
                        .is_some_and(|ids| ids.contains(&id))
                    {
                        return Err(DossierError::InvariantViolation(format!(
                            "{} missing from the {} type index",
                            id, record.entity_type
                        )));
                    }
                }
                Slot::Absorbed(_) => {
                    self.canonical_id(id)?;
                }
            }
        }

        for (key, &id) in &self.key_index {
            let canonical = self.canonical_id(id)?;
            let owns = self
                .live(canonical)
                .is_some_and(|record| record.keys().contains(key));
            if !owns {
                return Err(DossierError::InvariantViolation(format!(
                    "key '{}' points at {} which does not carry it",
                    key, canonical
                )));
            }
        }

        for ids in self.by_type.values() {
            if let Some(dead) = ids.iter().find(|&&id| !self.is_live(id)) {
                return Err(DossierError::InvariantViolation(format!(
                    "type index lists non-live {}",
                    dead
                )));
            }
        }
        Ok(())
    }

    fn indexed(&self, key: &NormalizedKey) -> Option<EntityId> {
        self.key_index
            .get(key)
            .and_then(|&id| self.canonical_id(id).ok())
    }

    fn record(&self, id: EntityId) -> Result<&EntityRecord> {
        let canonical = self.canonical_id(id)?;
        self.live(canonical).ok_or(DossierError::NotFound(id))
    }

    fn live(&self, id: EntityId) -> Option<&EntityRecord> {
        match self.slots.get(id.ordinal() as usize) {
            Some(Slot::Live(record)) => Some(record),
            _ => None,
        }
    }

    fn live_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        match self.slots.get_mut(id.ordinal() as usize) {
            Some(Slot::Live(record)) => Some(record),
            _ => None,
        }
    }

    fn create(&mut self, surface: &str, key: &NormalizedKey, sighting: Sighting) -> EntityId {
        let id = EntityId::new(self.slots.len() as u64);
        let mut record = EntityRecord::new(id, key.entity_type.clone());
        record.record_sighting(surface, key, sighting);
        self.slots.push(Slot::Live(record));
        self.key_index.insert(key.clone(), id);
        self.by_type
            .entry(key.entity_type.clone())
            .or_default()
            .insert(id);
        self.log
            .record(LogAction::Created, id, None, Some(json!({ "alias": surface })));
        id
    }

    /// Best similarity over the two entities' keys, boosted when they
    /// share a document.
    fn pair_similarity(&self, a: &EntityRecord, b: &EntityRecord) -> Option<Similarity> {
        let a_keys = a.keys();
        let b_keys = b.keys();
        let matched = a_keys
            .iter()
            .flat_map(|x| b_keys.iter().map(move |y| (*x, *y)))
            .filter_map(|(x, y)| similarity::score(x, y, &self.config))
            .max_by(|x, y| x.score.total_cmp(&y.score))?;
        if a.documents().iter().any(|&doc| b.has_document(doc)) {
            Some(matched.boosted(self.config.co_occurrence_boost))
        } else {
            Some(matched)
        }
    }

    /// File a review item for two existing entities if they score high
    /// enough. The newer entity is the source.
    fn suggest_pair(&mut self, x: EntityId, y: EntityId) -> Option<Uuid> {
        let (target, source) = if x <= y { (x, y) } else { (y, x) };
        let matched = {
            let a = self.live(source)?;
            let b = self.live(target)?;
            self.pair_similarity(a, b)?
        };
        if matched.score < self.config.suggest_threshold {
            return None;
        }
        let item = self.review.enqueue(source, target, matched)?;
        self.log.record(
            LogAction::Suggested,
            source,
            Some(target),
            Some(json!({
                "review_item": item.to_string(),
                "score": matched.score,
                "strategy": matched.strategy.to_string(),
                "rescan": true,
            })),
        );
        Some(item)
    }

    /// Highest-scoring same-type entity at or above the suggestion
    /// threshold. Ties: more mentions, then earlier first document, then
    /// lower id.
    fn best_candidate(&self, key: &NormalizedKey, document: DocumentId) -> Option<(EntityId, Similarity)> {
        let ids = self.by_type.get(&key.entity_type)?;
        let mut best: Option<(EntityId, Similarity, u64, DocumentId)> = None;

        for &id in ids {
            let Some(record) = self.live(id) else {
                continue;
            };
            let Some(mut matched) = record
                .keys()
                .into_iter()
                .filter_map(|alias| similarity::score(key, alias, &self.config))
                .max_by(|x, y| x.score.total_cmp(&y.score))
            else {
                continue;
            };
            if record.has_document(document) {
                matched = matched.boosted(self.config.co_occurrence_boost);
            }
            if matched.score < self.config.suggest_threshold {
                continue;
            }

            let mentions = record.mention_count();
            let first_doc = record
                .first_sighting()
                .map_or(DocumentId::MAX, |s| s.document);
            let better = match &best {
                None => true,
                Some((_, current, current_mentions, current_first)) => matched
                    .score
                    .total_cmp(&current.score)
                    .then(mentions.cmp(current_mentions))
                    .then(current_first.cmp(&first_doc))
                    .is_gt(),
            };
            if better {
                best = Some((id, matched, mentions, first_doc));
            }
        }

        best.map(|(id, matched, _, _)| (id, matched))
    }
}

/// Surface form kept as an alias: trimmed, inner whitespace collapsed.
fn surface_form(raw_text: &str) -> String {
    raw_text.split_whitespace().collect::<Vec<_>>().join(" ")
}
