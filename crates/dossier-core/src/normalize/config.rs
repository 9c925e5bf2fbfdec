use crate::error::{DossierError, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_HONORIFICS: &[&str] = &[
    "mr", "mrs", "ms", "miss", "mx", "dr", "prof", "rev", "hon", "sir", "dame", "lord", "lady",
];

const DEFAULT_PERSON_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "esq", "phd", "md"];

const DEFAULT_LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "llc",
    "ltd",
    "limited",
    "plc",
    "co",
    "company",
    "lp",
    "llp",
    "gmbh",
    "ag",
    "sa",
];

/// Configuration for mention normalization.
///
/// Word lists are policy, not an authoritative source: entries are
/// compared after punctuation removal and case folding, so `"Ph.D."`
/// and `"phd"` are the same entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Leading tokens stripped from `person` mentions. Default: common
    /// English honorifics (Mr, Dr, Prof, ...).
    pub honorifics: Vec<String>,

    /// Trailing tokens stripped from `person` mentions (Jr, III, Esq, ...).
    pub person_suffixes: Vec<String>,

    /// Rewrite `"Last, First"` to `"First Last"` for `person` mentions.
    /// Default: true
    pub reorder_last_first: bool,

    /// Strip trailing legal suffixes from `organization` mentions so
    /// `"Acme Corp."` and `"Acme"` share a key. Default: false
    pub strip_legal_suffixes: bool,

    /// Suffixes used when `strip_legal_suffixes` is on.
    pub legal_suffixes: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            honorifics: to_strings(DEFAULT_HONORIFICS),
            person_suffixes: to_strings(DEFAULT_PERSON_SUFFIXES),
            reorder_last_first: true,
            strip_legal_suffixes: false,
            legal_suffixes: to_strings(DEFAULT_LEGAL_SUFFIXES),
        }
    }
}

impl NormalizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_honorifics<I, S>(mut self, honorifics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.honorifics = honorifics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_person_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.person_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reorder_last_first(mut self, enabled: bool) -> Self {
        self.reorder_last_first = enabled;
        self
    }

    pub fn with_strip_legal_suffixes(mut self, enabled: bool) -> Self {
        self.strip_legal_suffixes = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let lists = [
            ("honorifics", &self.honorifics),
            ("person_suffixes", &self.person_suffixes),
            ("legal_suffixes", &self.legal_suffixes),
        ];
        for (name, list) in lists {
            if let Some(bad) = list.iter().find(|w| super::clean_token(w).is_empty()) {
                return Err(DossierError::Validation(format!(
                    "{} entry '{}' has no alphanumeric characters",
                    name, bad
                )));
            }
        }
        Ok(())
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
