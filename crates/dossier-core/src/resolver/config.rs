use crate::error::{DossierError, Result};
use serde::{Deserialize, Serialize};

/// Which alias becomes an entity's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayNamePolicy {
    /// Alias seen in the most documents; ties go to the earliest seen.
    #[default]
    MostFrequent,
    /// The first alias ever seen for the entity.
    FirstSeen,
}

/// Fuzzy-matching policy for the identity resolver.
///
/// None of these values are authoritative; they are tuned defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Try similarity matching when no exact key exists. Default: true.
    pub fuzzy_enabled: bool,

    /// Best candidate at or above this joins the candidate entity. Default: 0.85.
    pub auto_merge_threshold: f64,

    /// Best candidate in `[suggest, auto)` creates a new entity and files a
    /// review item. Default: 0.60.
    pub suggest_threshold: f64,

    /// Score for "j doe" ~ "jane doe". Default: 0.80.
    pub initial_match_score: f64,

    /// Token Jaccard must be strictly above this to count. Default: 0.5.
    pub token_overlap_floor: f64,

    /// Both keys must be longer than this many characters before edit
    /// distance is tried. Default: 8.
    pub edit_distance_min_len: usize,

    /// Default: 2.
    pub max_edit_distance: usize,

    /// Edit-distance score is `base - distance * step`. Defaults: 0.80 / 0.10.
    pub edit_distance_base: f64,
    pub edit_distance_step: f64,

    /// Added (capped at 1.0) when the candidate is already mentioned in the
    /// same document. Default: 0.10.
    pub co_occurrence_boost: f64,

    pub display_name: DisplayNamePolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_enabled: true,
            auto_merge_threshold: 0.85,
            suggest_threshold: 0.60,
            initial_match_score: 0.80,
            token_overlap_floor: 0.5,
            edit_distance_min_len: 8,
            max_edit_distance: 2,
            edit_distance_base: 0.80,
            edit_distance_step: 0.10,
            co_occurrence_boost: 0.10,
            display_name: DisplayNamePolicy::MostFrequent,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact key matching only.
    pub fn exact_only() -> Self {
        Self {
            fuzzy_enabled: false,
            ..Self::default()
        }
    }

    pub fn with_fuzzy(mut self, enabled: bool) -> Self {
        self.fuzzy_enabled = enabled;
        self
    }

    pub fn with_auto_merge_threshold(mut self, threshold: f64) -> Self {
        self.auto_merge_threshold = threshold;
        self
    }

    pub fn with_suggest_threshold(mut self, threshold: f64) -> Self {
        self.suggest_threshold = threshold;
        self
    }

    pub fn with_co_occurrence_boost(mut self, boost: f64) -> Self {
        self.co_occurrence_boost = boost;
        self
    }

    pub fn with_display_name(mut self, policy: DisplayNamePolicy) -> Self {
        self.display_name = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("auto_merge_threshold", self.auto_merge_threshold),
            ("suggest_threshold", self.suggest_threshold),
            ("initial_match_score", self.initial_match_score),
            ("edit_distance_base", self.edit_distance_base),
        ] {
            if !(0.0..=1.0).contains(&value) || value == 0.0 {
                return Err(DossierError::Validation(format!(
                    "{} must be in (0.0, 1.0]",
                    name
                )));
            }
        }

        if self.suggest_threshold > self.auto_merge_threshold {
            return Err(DossierError::Validation(
                "suggest_threshold must be <= auto_merge_threshold".into(),
            ));
        }

        if !(0.0..1.0).contains(&self.token_overlap_floor) {
            return Err(DossierError::Validation(
                "token_overlap_floor must be in [0.0, 1.0)".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.edit_distance_step) {
            return Err(DossierError::Validation(
                "edit_distance_step must be in [0.0, 1.0]".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.co_occurrence_boost) {
            return Err(DossierError::Validation(
                "co_occurrence_boost must be in [0.0, 1.0]".into(),
            ));
        }

        Ok(())
    }
}
