use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Movie counters, produced by the first aggregation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MovieStats {
    pub movies: u64,
    pub watchlist: u64,
    pub watchlist_runtime: Duration,
}

/// Show counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShowStats {
    pub shows: u64,
    pub continuing: u64,
    pub with_next_episode: u64,
}

/// Episode counters, specials excluded when the user asked for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub episodes: u64,
    pub watched: u64,
}

/// Point-in-time aggregate of the library.
///
/// Groups are `None` until the step computing them has run, so a consumer can
/// tell "zero" apart from "never got there".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub movies: Option<MovieStats>,
    pub shows: Option<ShowStats>,
    pub episodes: Option<EpisodeStats>,
    pub episodes_watched_runtime: Duration,
}

impl StatsSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_movies(self, movies: MovieStats) -> Self {
        Self {
            movies: Some(movies),
            ..self
        }
    }

    pub fn with_shows(self, shows: ShowStats) -> Self {
        Self {
            shows: Some(shows),
            ..self
        }
    }

    pub fn with_episodes(self, episodes: EpisodeStats) -> Self {
        Self {
            episodes: Some(episodes),
            ..self
        }
    }

    pub fn with_watched_runtime(self, runtime: Duration) -> Self {
        Self {
            episodes_watched_runtime: runtime,
            ..self
        }
    }

    /// True once every counter group has been filled in
    pub fn is_complete(&self) -> bool {
        self.movies.is_some() && self.shows.is_some() && self.episodes.is_some()
    }
}

/// Runtime of `count` episodes of `runtime_minutes` each, saturating
pub fn watched_runtime(runtime_minutes: u32, count: u64) -> Duration {
    let secs = u64::from(runtime_minutes)
        .saturating_mul(60)
        .saturating_mul(count);
    Duration::from_secs(secs)
}

/// Why a run ended without a complete snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatsFailure {
    MoviesQuery,
    ShowsQuery,
    EpisodesQuery,
    ShowRuntimeQuery { show_id: Uuid },
    Cancelled,
    WorkerPanicked,
}

impl std::fmt::Display for StatsFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFailure::MoviesQuery => write!(f, "movies query failed"),
            StatsFailure::ShowsQuery => write!(f, "shows query failed"),
            StatsFailure::EpisodesQuery => write!(f, "episodes query failed"),
            StatsFailure::ShowRuntimeQuery { show_id } => {
                write!(f, "watched episodes query failed for show {}", show_id)
            }
            StatsFailure::Cancelled => write!(f, "cancelled"),
            StatsFailure::WorkerPanicked => write!(f, "worker panicked"),
        }
    }
}

/// Progress of a statistics run, as seen by an observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatsEvent {
    /// Intermediate snapshot, more will follow
    Progress { snapshot: StatsSnapshot },
    /// Terminal, every step completed
    Finished { snapshot: StatsSnapshot },
    /// Terminal, carries whatever was computed before stopping
    Failed {
        snapshot: StatsSnapshot,
        failure: StatsFailure,
    },
}

impl StatsEvent {
    pub fn snapshot(&self) -> &StatsSnapshot {
        match self {
            StatsEvent::Progress { snapshot }
            | StatsEvent::Finished { snapshot }
            | StatsEvent::Failed { snapshot, .. } => snapshot,
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, StatsEvent::Progress { .. })
    }

    pub fn was_successful(&self) -> bool {
        matches!(self, StatsEvent::Finished { .. })
    }

    pub fn failure(&self) -> Option<StatsFailure> {
        match self {
            StatsEvent::Failed { failure, .. } => Some(*failure),
            _ => None,
        }
    }
}

/// A persisted copy of a successful run.
/// Never a source of truth, can be deleted and recomputed at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsRecord {
    pub id: Uuid,
    pub snapshot: StatsSnapshot,
    /// Library revision read before the run queried anything
    pub library_revision: i64,
    pub generated_at: DateTime<Utc>,
}

impl StatisticsRecord {
    pub fn new(snapshot: StatsSnapshot, library_revision: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            snapshot,
            library_revision,
            generated_at: Utc::now(),
        }
    }

    /// True when the library was written to after the run started
    pub fn is_stale(&self, current_revision: i64) -> bool {
        current_revision != self.library_revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformations_keep_earlier_groups() {
        let movies = MovieStats {
            movies: 3,
            watchlist: 1,
            watchlist_runtime: Duration::from_secs(90 * 60),
        };
        let shows = ShowStats {
            shows: 2,
            continuing: 1,
            with_next_episode: 1,
        };

        let first = StatsSnapshot::empty().with_movies(movies);
        let second = first.with_shows(shows);

        assert_eq!(first.shows, None);
        assert_eq!(second.movies, Some(movies));
        assert_eq!(second.shows, Some(shows));
        assert!(!second.is_complete());

        let third = second.with_episodes(EpisodeStats::default());
        assert!(third.is_complete());
    }

    #[test]
    fn test_watched_runtime_saturates() {
        assert_eq!(watched_runtime(30, 2), Duration::from_secs(3600));
        assert_eq!(watched_runtime(0, 100), Duration::ZERO);
        assert_eq!(watched_runtime(u32::MAX, u64::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_event_flags() {
        let snapshot = StatsSnapshot::empty();
        let progress = StatsEvent::Progress { snapshot };
        let finished = StatsEvent::Finished { snapshot };
        let failed = StatsEvent::Failed {
            snapshot,
            failure: StatsFailure::Cancelled,
        };

        assert!(!progress.is_final() && !progress.was_successful());
        assert!(finished.is_final() && finished.was_successful());
        assert!(failed.is_final() && !failed.was_successful());
        assert_eq!(failed.failure(), Some(StatsFailure::Cancelled));
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = StatsEvent::Failed {
            snapshot: StatsSnapshot::empty(),
            failure: StatsFailure::MoviesQuery,
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["type"], "failed");
        assert_eq!(json["failure"]["kind"], "movies_query");
    }

    #[test]
    fn test_record_is_stale_once_revision_moves() {
        let record = StatisticsRecord::new(StatsSnapshot::empty(), 7);

        assert!(!record.is_stale(7));
        assert!(record.is_stale(8));
    }
}
