//! Identity resolution
//!
//! Maps mentions to canonical entities through normalized keys, with
//! similarity matching for unseen spellings, manual merge/split, a review
//! queue for low-confidence matches and an audit log of every decision.

mod audit;
mod config;
mod identity;
mod record;
mod review;
pub mod similarity;

pub use audit::{LogAction, LogEntry, ResolutionLog};
pub use config::{DisplayNamePolicy, ResolverConfig};
pub use identity::{
    IdentityResolver, MergeOutcome, RescanOutcome, Resolution, ResolutionOutcome, SplitOutcome,
    SplitProvenance,
};
pub use record::{AliasProvenance, Sighting};
pub use review::{ReviewItem, ReviewQueue};
pub use similarity::{MatchStrategy, Similarity};

#[cfg(test)]
mod tests;
