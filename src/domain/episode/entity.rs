use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Season number reserved for specials (bonus content outside the regular run)
pub const SPECIALS_SEASON: u32 = 0;

/// A single episode belonging to a Show
/// Episodes are the unit of watch tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Reference to parent Show (REQUIRED)
    pub show_id: Uuid,

    /// Season number, 0 for specials
    pub season: u32,

    /// Episode number within the season
    pub number: u32,

    /// Episode title (optional)
    pub title: Option<String>,

    /// Watch state
    pub state: EpisodeState,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Watch state of an episode
///
/// Skipped episodes are neither watched nor pending; they never count
/// towards watched totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeState {
    Unwatched,
    Watched,
    Skipped,
}

impl Episode {
    /// Create a new Episode
    /// show_id MUST be valid (checked by caller)
    pub fn new(show_id: Uuid, season: u32, number: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            show_id,
            season,
            number,
            title: None,
            state: EpisodeState::Unwatched,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_special(&self) -> bool {
        self.season == SPECIALS_SEASON
    }

    pub fn is_watched(&self) -> bool {
        self.state == EpisodeState::Watched
    }

    pub fn set_state(&mut self, state: EpisodeState) {
        self.state = state;
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Display for EpisodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeState::Unwatched => write!(f, "unwatched"),
            EpisodeState::Watched => write!(f, "watched"),
            EpisodeState::Skipped => write!(f, "skipped"),
        }
    }
}

impl std::str::FromStr for EpisodeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unwatched" => Ok(EpisodeState::Unwatched),
            "watched" => Ok(EpisodeState::Watched),
            "skipped" => Ok(EpisodeState::Skipped),
            _ => Err(format!("Invalid episode state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_zero_is_special() {
        let show_id = Uuid::new_v4();
        assert!(Episode::new(show_id, 0, 1).is_special());
        assert!(!Episode::new(show_id, 1, 1).is_special());
    }

    #[test]
    fn test_skipped_is_not_watched() {
        let mut episode = Episode::new(Uuid::new_v4(), 1, 3);
        episode.set_state(EpisodeState::Skipped);
        assert!(!episode.is_watched());

        episode.set_state(EpisodeState::Watched);
        assert!(episode.is_watched());
    }
}
