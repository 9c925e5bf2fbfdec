//! Alias similarity scoring.
//!
//! Works on normalized key text, so punctuation and casing are already
//! gone: "J. Doe" arrives here as "j doe".

use crate::normalize::NormalizedKey;
use crate::resolver::config::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How a similarity score was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Initial,
    TokenOverlap,
    EditDistance,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Exact => write!(f, "exact"),
            MatchStrategy::Initial => write!(f, "initial"),
            MatchStrategy::TokenOverlap => write!(f, "token_overlap"),
            MatchStrategy::EditDistance => write!(f, "edit_distance"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub score: f64,
    pub strategy: MatchStrategy,
}

impl Similarity {
    pub(crate) fn boosted(self, boost: f64) -> Self {
        Self {
            score: (self.score + boost).min(1.0),
            ..self
        }
    }
}

/// Token-level Jaccard similarity.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}

/// True when one name is the initial form of the other: "j doe" and
/// "jane doe". Both need at least two tokens and equal last tokens.
pub fn initial_match(a: &str, b: &str) -> bool {
    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();
    if tokens_a.len() < 2 || tokens_b.len() < 2 {
        return false;
    }
    if tokens_a.last() != tokens_b.last() {
        return false;
    }
    let (first_a, first_b) = (tokens_a[0], tokens_b[0]);
    let is_initial = |t: &str| t.chars().count() == 1;
    (is_initial(first_a) && first_b.starts_with(first_a))
        || (is_initial(first_b) && first_a.starts_with(first_b))
}

/// Typo detection for long names. None when either key is too short or
/// the distance exceeds the configured maximum.
pub fn edit_distance_score(a: &str, b: &str, config: &ResolverConfig) -> Option<f64> {
    if a.chars().count() <= config.edit_distance_min_len
        || b.chars().count() <= config.edit_distance_min_len
    {
        return None;
    }
    let distance = strsim::levenshtein(a, b);
    if distance > config.max_edit_distance {
        return None;
    }
    let score = config.edit_distance_base - distance as f64 * config.edit_distance_step;
    (score > 0.0).then_some(score)
}

/// Best similarity between two keys of the same type, if any strategy fires.
pub fn score(a: &NormalizedKey, b: &NormalizedKey, config: &ResolverConfig) -> Option<Similarity> {
    if a.entity_type != b.entity_type || a.is_empty() || b.is_empty() {
        return None;
    }
    if a.text == b.text {
        return Some(Similarity {
            score: 1.0,
            strategy: MatchStrategy::Exact,
        });
    }
    if initial_match(&a.text, &b.text) {
        return Some(Similarity {
            score: config.initial_match_score,
            strategy: MatchStrategy::Initial,
        });
    }

    let mut best: Option<Similarity> = None;
    let jaccard = jaccard_similarity(&a.text, &b.text);
    if jaccard > config.token_overlap_floor {
        best = Some(Similarity {
            score: jaccard,
            strategy: MatchStrategy::TokenOverlap,
        });
    }
    if let Some(edit) = edit_distance_score(&a.text, &b.text, config) {
        if best.map_or(true, |b| edit > b.score) {
            best = Some(Similarity {
                score: edit,
                strategy: MatchStrategy::EditDistance,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::defaults;

    fn key(text: &str) -> NormalizedKey {
        NormalizedKey {
            entity_type: defaults::person(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard_similarity("jane doe", "doe jane"), 1.0);
        assert!((jaccard_similarity("jane doe", "jane q doe") - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(jaccard_similarity("", "jane"), 0.0);
    }

    #[test]
    fn test_initial_match() {
        assert!(initial_match("j doe", "jane doe"));
        assert!(initial_match("jane doe", "j doe"));
        assert!(!initial_match("k doe", "jane doe"));
        assert!(!initial_match("j smith", "jane doe"));
        assert!(!initial_match("doe", "jane doe"));
    }

    #[test]
    fn test_edit_distance_requires_long_names() {
        let config = ResolverConfig::default();
        let score = edit_distance_score("jonathan smyth", "jonathan smith", &config).unwrap();
        assert!((score - 0.70).abs() < 1e-9);
        assert!(edit_distance_score("jon doe", "jan doe", &config).is_none());
        assert!(edit_distance_score("jonathan smith", "jonathon smyth", &config).is_some());
        assert!(edit_distance_score("jonathan smith", "jennifer smith", &config).is_none());
    }

    #[test]
    fn test_score_picks_strategy() {
        let config = ResolverConfig::default();

        let initial = score(&key("j doe"), &key("jane doe"), &config).unwrap();
        assert_eq!(initial.strategy, MatchStrategy::Initial);
        assert_eq!(initial.score, 0.80);

        let overlap = score(&key("jane q doe"), &key("jane doe"), &config).unwrap();
        assert_eq!(overlap.strategy, MatchStrategy::TokenOverlap);

        let typo = score(&key("jonathan smyth"), &key("jonathan smith"), &config).unwrap();
        assert_eq!(typo.strategy, MatchStrategy::EditDistance);

        assert!(score(&key("alice"), &key("bob"), &config).is_none());
    }

    #[test]
    fn test_score_never_crosses_types() {
        let config = ResolverConfig::default();
        let org = NormalizedKey {
            entity_type: defaults::organization(),
            text: "jane doe".into(),
        };
        assert!(score(&key("jane doe"), &org, &config).is_none());
    }

    #[test]
    fn test_boost_is_capped() {
        let sim = Similarity {
            score: 0.95,
            strategy: MatchStrategy::TokenOverlap,
        };
        assert_eq!(sim.boosted(0.1).score, 1.0);
    }
}
