use crate::normalize::NormalizedKey;
use crate::resolver::config::DisplayNamePolicy;
use crate::types::{CanonicalEntity, DocumentId, EntityId, EntityType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A point in resolution order: the resolver's monotonic sequence number
/// plus the document the mention came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sighting {
    pub seq: u64,
    pub document: DocumentId,
}

/// Mention-level provenance for one surface spelling of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasProvenance {
    pub key: NormalizedKey,
    pub documents: BTreeSet<DocumentId>,
    pub first: Sighting,
    pub last: Sighting,
}

impl AliasProvenance {
    fn new(key: NormalizedKey, sighting: Sighting) -> Self {
        Self {
            key,
            documents: BTreeSet::from([sighting.document]),
            first: sighting,
            last: sighting,
        }
    }

    fn absorb(&mut self, other: AliasProvenance) {
        self.documents.extend(other.documents);
        self.first = self.first.min(other.first);
        self.last = self.last.max(other.last);
    }
}

/// Surface spelling plus the key it normalized to. The same spelling can
/// carry one key per entity type once a merge crosses types.
pub(crate) type AliasKey = (String, NormalizedKey);

/// Arena record of a live canonical entity. Owned by the resolver.
#[derive(Debug, Clone)]
pub(crate) struct EntityRecord {
    pub(crate) id: EntityId,
    pub(crate) entity_type: EntityType,
    pub(crate) aliases: BTreeMap<AliasKey, AliasProvenance>,
    pub(crate) absorbed_ids: Vec<EntityId>,
    pub(crate) split_ambiguous: bool,
    pub(crate) created_at: DateTime<Utc>,
}

impl EntityRecord {
    pub(crate) fn new(id: EntityId, entity_type: EntityType) -> Self {
        Self {
            id,
            entity_type,
            aliases: BTreeMap::new(),
            absorbed_ids: Vec::new(),
            split_ambiguous: false,
            created_at: Utc::now(),
        }
    }

    /// Attach one mention. Returns true if the `(alias, document)` pair
    /// was not known yet.
    pub(crate) fn record_sighting(&mut self, surface: &str, key: &NormalizedKey, sighting: Sighting) -> bool {
        let alias_key = (surface.to_string(), key.clone());
        match self.aliases.get_mut(&alias_key) {
            Some(alias) => {
                if !alias.documents.insert(sighting.document) {
                    return false;
                }
                alias.last = sighting;
                true
            }
            None => {
                self.aliases
                    .insert(alias_key, AliasProvenance::new(key.clone(), sighting));
                true
            }
        }
    }

    pub(crate) fn mention_count(&self) -> u64 {
        self.aliases.values().map(|a| a.documents.len() as u64).sum()
    }

    pub(crate) fn documents(&self) -> BTreeSet<DocumentId> {
        self.aliases
            .values()
            .flat_map(|a| a.documents.iter().copied())
            .collect()
    }

    pub(crate) fn has_document(&self, document: DocumentId) -> bool {
        self.aliases.values().any(|a| a.documents.contains(&document))
    }

    pub(crate) fn keys(&self) -> BTreeSet<&NormalizedKey> {
        self.aliases.values().map(|a| &a.key).collect()
    }

    /// Distinct surface spellings, across every key.
    pub(crate) fn surfaces(&self) -> BTreeSet<String> {
        self.aliases.keys().map(|(surface, _)| surface.clone()).collect()
    }

    pub(crate) fn first_sighting(&self) -> Option<Sighting> {
        self.aliases.values().map(|a| a.first).min()
    }

    pub(crate) fn last_sighting(&self) -> Option<Sighting> {
        self.aliases.values().map(|a| a.last).max()
    }

    pub(crate) fn display_name(&self, policy: DisplayNamePolicy) -> String {
        let chosen = match policy {
            DisplayNamePolicy::MostFrequent => self.aliases.iter().min_by(|(_, x), (_, y)| {
                y.documents
                    .len()
                    .cmp(&x.documents.len())
                    .then(x.first.cmp(&y.first))
            }),
            DisplayNamePolicy::FirstSeen => self.aliases.iter().min_by_key(|(_, a)| a.first),
        };
        chosen.map(|((surface, _), _)| surface.clone()).unwrap_or_default()
    }

    /// Fold another record into this one.
    pub(crate) fn absorb(&mut self, other: EntityRecord) {
        for (alias_key, provenance) in other.aliases {
            match self.aliases.get_mut(&alias_key) {
                Some(existing) => existing.absorb(provenance),
                None => {
                    self.aliases.insert(alias_key, provenance);
                }
            }
        }
        self.absorbed_ids.push(other.id);
        self.absorbed_ids.extend(other.absorbed_ids);
        self.split_ambiguous |= other.split_ambiguous;
    }

    /// Remove every alias whose key is in `keys`.
    pub(crate) fn extract(&mut self, keys: &BTreeSet<NormalizedKey>) -> BTreeMap<AliasKey, AliasProvenance> {
        let selected: Vec<AliasKey> = self
            .aliases
            .keys()
            .filter(|(_, key)| keys.contains(key))
            .cloned()
            .collect();
        selected
            .into_iter()
            .filter_map(|alias_key| self.aliases.remove_entry(&alias_key))
            .collect()
    }

    pub(crate) fn to_entity(&self, policy: DisplayNamePolicy) -> CanonicalEntity {
        CanonicalEntity {
            entity_id: self.id,
            entity_type: self.entity_type.clone(),
            display_name: self.display_name(policy),
            aliases: self.surfaces(),
            mention_count: self.mention_count(),
            document_count: self.documents().len(),
            first_seen_doc: self.first_sighting().map(|s| s.document).unwrap_or_default(),
            last_seen_doc: self.last_sighting().map(|s| s.document).unwrap_or_default(),
            absorbed_ids: self.absorbed_ids.clone(),
            split_ambiguous: self.split_ambiguous,
            created_at: self.created_at,
        }
    }
}
