mod types;
mod store;
mod snapshot;
mod stats;
mod paths;

pub use types::*;
pub use store::CooccurrenceGraph;
pub use snapshot::GraphSnapshot;
pub use stats::GraphStats;
pub use paths::{Neighbor, PathResult};

#[cfg(test)]
mod tests;
