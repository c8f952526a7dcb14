use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked TV show
/// This is the root entity for all episode data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Display title
    pub title: String,

    /// Airing status as reported by the metadata source
    pub status: ShowStatus,

    /// Next episode the user has not watched yet (if any)
    pub next_episode: Option<Uuid>,

    /// Typical runtime of a single episode, in minutes
    pub runtime_minutes: u32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Airing status of a show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowStatus {
    Continuing,
    Ended,
    Unknown,
}

impl Show {
    /// Create a new Show
    pub fn new(title: String, status: ShowStatus, runtime_minutes: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            status,
            next_episode: None,
            runtime_minutes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Point the next-episode marker at a different episode (or clear it)
    pub fn set_next_episode(&mut self, episode_id: Option<Uuid>) {
        self.next_episode = episode_id;
        self.updated_at = Utc::now();
    }

    pub fn has_next_episode(&self) -> bool {
        self.next_episode.is_some()
    }
}

impl std::fmt::Display for ShowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShowStatus::Continuing => write!(f, "continuing"),
            ShowStatus::Ended => write!(f, "ended"),
            ShowStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for ShowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "continuing" => Ok(ShowStatus::Continuing),
            "ended" => Ok(ShowStatus::Ended),
            "unknown" => Ok(ShowStatus::Unknown),
            _ => Err(format!("Invalid show status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_string() {
        for status in [ShowStatus::Continuing, ShowStatus::Ended, ShowStatus::Unknown] {
            let parsed: ShowStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("airing".parse::<ShowStatus>().is_err());
    }

    #[test]
    fn test_next_episode_marker() {
        let mut show = Show::new("Firefly".to_string(), ShowStatus::Ended, 44);
        assert!(!show.has_next_episode());

        show.set_next_episode(Some(Uuid::new_v4()));
        assert!(show.has_next_episode());
    }
}
