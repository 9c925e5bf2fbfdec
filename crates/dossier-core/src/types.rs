use crate::error::{DossierError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Document identifier, assigned durably by the storage layer before
/// mentions reach the core. Ordering follows storage assignment order.
pub type DocumentId = u64;

/// Stable identifier of a canonical entity.
///
/// Allocated from a monotonic counter and never reused. The ordinal is
/// what tie-breaks compare ("lower entity id wins").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new(ordinal: u64) -> Self {
        Self(ordinal)
    }

    pub fn ordinal(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// Entity type tag produced by the NER pass.
///
/// Validated, lowercase, `[a-z0-9_-]+`. Part of every normalization key,
/// so a `person` and an `organization` with the same text never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(DossierError::Validation("entity type must not be empty".into()));
        }
        if name.len() > 64 {
            return Err(DossierError::Validation(format!(
                "entity type '{}' exceeds 64 characters",
                name
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DossierError::Validation(format!(
                "entity type '{}' may only contain [a-z0-9_-]",
                name
            )));
        }
        Ok(Self(name))
    }

    /// Construct one of the built-in kinds without validation.
    pub(crate) fn builtin(name: &'static str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_person(&self) -> bool {
        self.0 == crate::kinds::PERSON
    }

    pub fn is_organization(&self) -> bool {
        self.0 == crate::kinds::ORGANIZATION
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityType {
    type Error = DossierError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.0
    }
}

/// One occurrence of an entity name in one document, as handed over by
/// the NER pass. Ephemeral: only the document id survives resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub raw_text: String,
    pub entity_type: EntityType,
    pub document_id: DocumentId,
    /// Character offset within the document, if the NER pass reported one.
    #[serde(default)]
    pub offset: Option<usize>,
}

impl Mention {
    pub fn new(raw_text: impl Into<String>, entity_type: EntityType, document_id: DocumentId) -> Self {
        Self {
            raw_text: raw_text.into(),
            entity_type,
            document_id,
            offset: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// The deduplicated identity a set of mentions resolves to.
///
/// This is a read-only view built from the resolver's internal record;
/// the resolver owns the entity, the graph only references its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    /// Stable for the entity's whole lifetime.
    pub entity_id: EntityId,

    pub entity_type: EntityType,

    /// Most frequent (or first-seen, per config) surface alias.
    pub display_name: String,

    /// Every surface spelling that resolved to this entity.
    pub aliases: BTreeSet<String>,

    /// Distinct (alias, document) pairs. Re-resolving the same mention
    /// in the same document does not increase it.
    pub mention_count: u64,

    /// Number of distinct documents mentioning the entity.
    pub document_count: usize,

    pub first_seen_doc: DocumentId,

    pub last_seen_doc: DocumentId,

    /// Ids folded into this entity by merges. They resolve here forever.
    pub absorbed_ids: Vec<EntityId>,

    /// Set when a split could not attribute every document and kept the
    /// full document set on both sides. Needs manual review.
    pub split_ambiguous: bool,

    pub created_at: DateTime<Utc>,
}
