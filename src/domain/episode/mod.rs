pub mod entity;
pub mod invariants;

pub use entity::{Episode, EpisodeState};
pub use invariants::validate_episode;
