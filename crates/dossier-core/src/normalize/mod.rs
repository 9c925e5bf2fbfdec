//! Mention normalization
//!
//! Turns a raw mention string into a comparable key. The transformation
//! is pure and total:
//! - Unicode NFKC fold, then lowercase
//! - For `person`: strip leading honorifics and trailing suffixes, then
//!   rewrite `"Last, First"` as `"First Last"`
//! - For `organization` (opt-in): strip trailing legal suffixes
//! - Drop punctuation inside tokens, collapse whitespace
//!
//! The entity type is part of the key.

mod config;

pub use config::NormalizerConfig;

use crate::types::EntityType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Comparable identity key of a mention: type plus folded text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedKey {
    pub entity_type: EntityType,
    pub text: String,
}

impl NormalizedKey {
    /// Keys with no alphanumeric content carry no identity.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.text.split(' ').filter(|t| !t.is_empty())
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.text)
    }
}

/// Stateless mention normalizer. Word lists are pre-folded at construction.
#[derive(Debug, Clone)]
pub struct Normalizer {
    honorifics: HashSet<String>,
    person_suffixes: HashSet<String>,
    legal_suffixes: HashSet<String>,
    reorder_last_first: bool,
    strip_legal_suffixes: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        let fold = |words: &[String]| -> HashSet<String> {
            words
                .iter()
                .map(|w| clean_token(w))
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            honorifics: fold(&config.honorifics),
            person_suffixes: fold(&config.person_suffixes),
            legal_suffixes: fold(&config.legal_suffixes),
            reorder_last_first: config.reorder_last_first,
            strip_legal_suffixes: config.strip_legal_suffixes,
        }
    }

    /// Canonicalize a raw mention into its key. Never fails.
    pub fn normalize(&self, raw_text: &str, entity_type: &EntityType) -> NormalizedKey {
        let folded: String = raw_text.nfkc().collect();
        let mut tokens: Vec<&str> = folded.split_whitespace().collect();

        let text = if entity_type.is_person() {
            strip_leading(&mut tokens, &self.honorifics);
            strip_trailing(&mut tokens, &self.person_suffixes);
            let joined = tokens.join(" ");
            if self.reorder_last_first {
                reorder_last_first(&joined)
            } else {
                joined
            }
        } else {
            if entity_type.is_organization() && self.strip_legal_suffixes {
                strip_trailing(&mut tokens, &self.legal_suffixes);
            }
            tokens.join(" ")
        };

        NormalizedKey {
            entity_type: entity_type.clone(),
            text: clean_text(&text),
        }
    }
}

/// Lowercase and keep only alphanumeric characters.
pub(crate) fn clean_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .map(clean_token)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// Both strippers keep at least one token: "Dr." alone stays "dr".
fn strip_leading(tokens: &mut Vec<&str>, words: &HashSet<String>) {
    let mut start = 0;
    while tokens.len() - start > 1 {
        let cleaned = clean_token(tokens[start]);
        if cleaned.is_empty() || words.contains(&cleaned) {
            start += 1;
        } else {
            break;
        }
    }
    tokens.drain(..start);
}

fn strip_trailing(tokens: &mut Vec<&str>, words: &HashSet<String>) {
    while tokens.len() > 1 {
        let cleaned = clean_token(tokens[tokens.len() - 1]);
        if cleaned.is_empty() || words.contains(&cleaned) {
            tokens.pop();
        } else {
            break;
        }
    }
}

fn reorder_last_first(text: &str) -> String {
    match text.split_once(',') {
        Some((last, first))
            if !clean_text(last).is_empty() && !clean_text(first).is_empty() =>
        {
            format!("{} {}", first.trim(), last.trim())
        }
        _ => text.to_string(),
    }
}
