// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are UI-friendly representations
// - DTOs NEVER leak domain invariants
// - DTOs are simple, serializable structs
// - Conversion FROM domain entities only (never TO)

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{Episode, Movie, Show, StatisticsRecord, StatsEvent, StatsSnapshot};

// ============================================================================
// LIBRARY DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowDto {
    pub id: String,
    pub title: String,
    pub status: String,
    pub runtime_minutes: u32,
    pub next_episode: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeDto {
    pub id: String,
    pub show_id: String,
    pub season: u32,
    pub number: u32,
    pub title: Option<String>,
    pub state: String,
    pub is_special: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDto {
    pub id: i64,
    pub title: String,
    pub in_watchlist: bool,
    pub runtime_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEpisodeDto {
    pub season: u32,
    pub number: u32,
    pub title: Option<String>,
    /// "unwatched", "watched" or "skipped"; unwatched when absent
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddShowDto {
    pub title: String,
    /// "continuing", "ended" or "unknown"
    pub status: String,
    pub runtime_minutes: u32,
    pub episodes: Vec<NewEpisodeDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMovieDto {
    pub tmdb_id: i64,
    pub title: String,
    pub runtime_minutes: u32,
    pub in_watchlist: bool,
}

// ============================================================================
// STATISTICS DTOs
// ============================================================================

/// Flat view of a snapshot. Counters of a step that never ran are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDto {
    pub shows: Option<u64>,
    pub shows_continuing: Option<u64>,
    pub shows_with_next_episode: Option<u64>,
    pub episodes: Option<u64>,
    pub episodes_watched: Option<u64>,
    pub episodes_watched_runtime_minutes: u64,
    pub episodes_watched_runtime: String,
    pub movies: Option<u64>,
    pub movies_watchlist: Option<u64>,
    pub movies_watchlist_runtime_minutes: Option<u64>,
    pub movies_watchlist_runtime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsEventDto {
    pub is_final: bool,
    pub was_successful: bool,
    /// Why the run failed, only on unsuccessful final events
    pub failure: Option<String>,
    pub stats: StatsDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedStatsDto {
    pub generated_at: String,
    /// True when the library changed after this snapshot was taken
    pub stale: bool,
    pub stats: StatsDto,
}

impl CachedStatsDto {
    pub fn new(record: StatisticsRecord, stale: bool) -> Self {
        Self {
            generated_at: record.generated_at.to_rfc3339(),
            stale,
            stats: StatsDto::from(record.snapshot),
        }
    }
}

/// Human-readable runtime, e.g. "2d 3h 15m"
pub fn format_runtime(runtime: Duration) -> String {
    let total_minutes = runtime.as_secs() / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

// ============================================================================
// CONVERSIONS (Domain → DTO)
// ============================================================================

impl From<Show> for ShowDto {
    fn from(show: Show) -> Self {
        Self {
            id: show.id.to_string(),
            title: show.title,
            status: show.status.to_string(),
            runtime_minutes: show.runtime_minutes,
            next_episode: show.next_episode.map(|id| id.to_string()),
            updated_at: show.updated_at.to_rfc3339(),
        }
    }
}

impl From<Episode> for EpisodeDto {
    fn from(episode: Episode) -> Self {
        Self {
            is_special: episode.is_special(),
            id: episode.id.to_string(),
            show_id: episode.show_id.to_string(),
            season: episode.season,
            number: episode.number,
            title: episode.title,
            state: episode.state.to_string(),
        }
    }
}

impl From<Movie> for MovieDto {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            in_watchlist: movie.in_watchlist,
            runtime_minutes: movie.runtime_minutes,
        }
    }
}

impl From<StatsSnapshot> for StatsDto {
    fn from(snapshot: StatsSnapshot) -> Self {
        let watched_runtime = snapshot.episodes_watched_runtime;
        Self {
            shows: snapshot.shows.map(|s| s.shows),
            shows_continuing: snapshot.shows.map(|s| s.continuing),
            shows_with_next_episode: snapshot.shows.map(|s| s.with_next_episode),
            episodes: snapshot.episodes.map(|e| e.episodes),
            episodes_watched: snapshot.episodes.map(|e| e.watched),
            episodes_watched_runtime_minutes: watched_runtime.as_secs() / 60,
            episodes_watched_runtime: format_runtime(watched_runtime),
            movies: snapshot.movies.map(|m| m.movies),
            movies_watchlist: snapshot.movies.map(|m| m.watchlist),
            movies_watchlist_runtime_minutes: snapshot
                .movies
                .map(|m| m.watchlist_runtime.as_secs() / 60),
            movies_watchlist_runtime: snapshot.movies.map(|m| format_runtime(m.watchlist_runtime)),
        }
    }
}

impl From<StatsEvent> for StatsEventDto {
    fn from(event: StatsEvent) -> Self {
        Self {
            is_final: event.is_final(),
            was_successful: event.was_successful(),
            failure: event.failure().map(|failure| failure.to_string()),
            stats: StatsDto::from(*event.snapshot()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EpisodeStats, MovieStats, ShowStats, StatsFailure};

    #[test]
    fn test_format_runtime() {
        assert_eq!(format_runtime(Duration::ZERO), "0m");
        assert_eq!(format_runtime(Duration::from_secs(45 * 60)), "45m");
        assert_eq!(format_runtime(Duration::from_secs(120 * 60)), "2h 0m");
        assert_eq!(
            format_runtime(Duration::from_secs((2 * 24 * 60 + 3 * 60 + 15) * 60)),
            "2d 3h 15m"
        );
    }

    #[test]
    fn test_partial_snapshot_keeps_missing_groups_empty() {
        let snapshot = StatsSnapshot::empty().with_movies(MovieStats {
            movies: 3,
            watchlist: 1,
            watchlist_runtime: Duration::from_secs(136 * 60),
        });

        let dto = StatsDto::from(snapshot);

        assert_eq!(dto.movies, Some(3));
        assert_eq!(dto.movies_watchlist_runtime_minutes, Some(136));
        assert_eq!(dto.movies_watchlist_runtime.as_deref(), Some("2h 16m"));
        assert_eq!(dto.shows, None);
        assert_eq!(dto.episodes_watched, None);
        assert_eq!(dto.episodes_watched_runtime_minutes, 0);
    }

    #[test]
    fn test_event_dto_flags() {
        let snapshot = StatsSnapshot::empty()
            .with_movies(MovieStats::default())
            .with_shows(ShowStats {
                shows: 2,
                continuing: 1,
                with_next_episode: 1,
            })
            .with_episodes(EpisodeStats {
                episodes: 10,
                watched: 4,
            })
            .with_watched_runtime(Duration::from_secs(180 * 60));

        let finished = StatsEventDto::from(StatsEvent::Finished { snapshot });
        assert!(finished.is_final && finished.was_successful);
        assert_eq!(finished.failure, None);
        assert_eq!(finished.stats.episodes_watched_runtime, "3h 0m");

        let failed = StatsEventDto::from(StatsEvent::Failed {
            snapshot,
            failure: StatsFailure::Cancelled,
        });
        assert!(failed.is_final && !failed.was_successful);
        assert_eq!(failed.failure.as_deref(), Some("cancelled"));

        let progress = StatsEventDto::from(StatsEvent::Progress { snapshot });
        assert!(!progress.is_final && !progress.was_successful);
    }
}
