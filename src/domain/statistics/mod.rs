//! Critical Statistics Invariants:
//!
//! 1. Statistics are ALWAYS derived, NEVER primary
//! 2. Statistics can be recalculated at any time
//! 3. Statistics NEVER alter domain state
//! 4. A snapshot is a value; later snapshots are built from earlier ones
//! 5. A group that was computed is never dropped or changed by a later step

pub mod entity;
pub use entity::{
    watched_runtime, EpisodeStats, MovieStats, ShowStats, StatisticsRecord, StatsEvent,
    StatsFailure, StatsSnapshot,
};
