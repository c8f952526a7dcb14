// src/services/stats_task.rs
//
// Statistics aggregation - one sequential pass over the library
//
// CRITICAL RULES:
// - Queries run strictly one after another, on the calling thread
// - Every query failure stops the run; nothing is retried
// - Snapshots only grow: a computed group is never dropped or changed
// - Cancellation is polled, never forced

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{
    watched_runtime, EpisodeStats, MovieStats, ShowStats, ShowStatus, StatsEvent, StatsFailure,
    StatsSnapshot,
};
use crate::error::{AppError, AppResult};
use crate::repositories::{EpisodeFilter, EpisodeRepository, MovieRepository, ShowRepository};

pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsOptions {
    /// Leave season 0 out of episode counts and watched runtime
    pub exclude_specials: bool,
    /// Minimum spacing of intermediate events while summing runtimes
    pub publish_interval: Duration,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            exclude_specials: false,
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
        }
    }
}

/// Read-only access to the collections the aggregation reads
#[derive(Clone)]
pub struct StatsSources {
    pub shows: Arc<dyn ShowRepository>,
    pub episodes: Arc<dyn EpisodeRepository>,
    pub movies: Arc<dyn MovieRepository>,
}

/// Why `compute` stopped, with what it had so far
#[derive(Debug)]
struct Halted {
    snapshot: StatsSnapshot,
    failure: StatsFailure,
}

pub struct StatsTask {
    sources: StatsSources,
    options: StatsOptions,
    cancel: CancellationToken,
}

impl StatsTask {
    pub fn new(sources: StatsSources, options: StatsOptions, cancel: CancellationToken) -> Self {
        Self {
            sources,
            options,
            cancel,
        }
    }

    /// Run every step, handing intermediate events to `on_progress`.
    ///
    /// Returns the terminal event; it is NOT passed to `on_progress`.
    pub fn run(&self, on_progress: &mut dyn FnMut(StatsEvent)) -> StatsEvent {
        match self.compute(on_progress) {
            Ok(snapshot) => {
                log::info!(
                    "Stats run finished: {} shows, {} movies, {}s watched",
                    snapshot.shows.map(|s| s.shows).unwrap_or(0),
                    snapshot.movies.map(|m| m.movies).unwrap_or(0),
                    snapshot.episodes_watched_runtime.as_secs()
                );
                StatsEvent::Finished { snapshot }
            }
            Err(Halted { snapshot, failure }) => StatsEvent::Failed { snapshot, failure },
        }
    }

    fn compute(&self, on_progress: &mut dyn FnMut(StatsEvent)) -> Result<StatsSnapshot, Halted> {
        let snapshot = StatsSnapshot::empty();

        let movies = self
            .movie_stats()
            .map_err(|e| halt(snapshot, StatsFailure::MoviesQuery, e))?;
        let snapshot = snapshot.with_movies(movies);
        self.check_cancelled(snapshot)?;

        let (shows, runtimes) = self
            .show_stats()
            .map_err(|e| halt(snapshot, StatsFailure::ShowsQuery, e))?;
        let snapshot = snapshot.with_shows(shows);

        let episodes = self
            .episode_stats()
            .map_err(|e| halt(snapshot, StatsFailure::EpisodesQuery, e))?;
        let snapshot = snapshot.with_episodes(episodes);
        self.check_cancelled(snapshot)?;

        on_progress(StatsEvent::Progress { snapshot });

        let runtime = self.sum_watched_runtime(snapshot, &runtimes, on_progress)?;

        Ok(snapshot.with_watched_runtime(runtime))
    }

    fn movie_stats(&self) -> AppResult<MovieStats> {
        let rows = self.sources.movies.list_stats_rows()?;

        let mut stats = MovieStats {
            movies: rows.len() as u64,
            ..MovieStats::default()
        };
        for row in rows.iter().filter(|row| row.in_watchlist) {
            stats.watchlist += 1;
            stats.watchlist_runtime = stats
                .watchlist_runtime
                .saturating_add(watched_runtime(row.runtime_minutes, 1));
        }

        log::debug!("Movies: {} total, {} in watchlist", stats.movies, stats.watchlist);
        Ok(stats)
    }

    /// Show counters plus the per-episode runtime of every show
    fn show_stats(&self) -> AppResult<(ShowStats, Vec<(Uuid, u32)>)> {
        let rows = self.sources.shows.list_stats_rows()?;

        let stats = ShowStats {
            shows: rows.len() as u64,
            continuing: rows
                .iter()
                .filter(|row| row.status == ShowStatus::Continuing)
                .count() as u64,
            with_next_episode: rows.iter().filter(|row| row.has_next_episode).count() as u64,
        };
        let runtimes = rows.iter().map(|row| (row.id, row.runtime_minutes)).collect();

        log::debug!(
            "Shows: {} total, {} continuing, {} with next episode",
            stats.shows,
            stats.continuing,
            stats.with_next_episode
        );
        Ok((stats, runtimes))
    }

    fn episode_stats(&self) -> AppResult<EpisodeStats> {
        let exclude = self.options.exclude_specials;
        let episodes = self
            .sources
            .episodes
            .count(EpisodeFilter::all().excluding_specials(exclude))?;
        let watched = self
            .sources
            .episodes
            .count(EpisodeFilter::watched().excluding_specials(exclude))?;

        log::debug!("Episodes: {} total, {} watched", episodes, watched);
        Ok(EpisodeStats { episodes, watched })
    }

    /// Sum watched runtime show by show, publishing at most once per interval
    fn sum_watched_runtime(
        &self,
        snapshot: StatsSnapshot,
        runtimes: &[(Uuid, u32)],
        on_progress: &mut dyn FnMut(StatsEvent),
    ) -> Result<Duration, Halted> {
        let mut total = Duration::ZERO;
        let mut last_publish = Instant::now();

        for &(show_id, runtime_minutes) in runtimes {
            self.check_cancelled(snapshot.with_watched_runtime(total))?;

            let filter = EpisodeFilter::watched()
                .for_show(show_id)
                .excluding_specials(self.options.exclude_specials);
            let watched = self.sources.episodes.count(filter).map_err(|e| {
                halt(
                    snapshot.with_watched_runtime(total),
                    StatsFailure::ShowRuntimeQuery { show_id },
                    e,
                )
            })?;
            total = total.saturating_add(watched_runtime(runtime_minutes, watched));

            if last_publish.elapsed() >= self.options.publish_interval {
                on_progress(StatsEvent::Progress {
                    snapshot: snapshot.with_watched_runtime(total),
                });
                last_publish = Instant::now();
            }
        }

        Ok(total)
    }

    fn check_cancelled(&self, snapshot: StatsSnapshot) -> Result<(), Halted> {
        if self.cancel.is_cancelled() {
            log::info!("Stats run cancelled");
            return Err(Halted {
                snapshot,
                failure: StatsFailure::Cancelled,
            });
        }
        Ok(())
    }
}

fn halt(snapshot: StatsSnapshot, failure: StatsFailure, error: AppError) -> Halted {
    log::warn!("Stats run stopped, {}: {}", failure, error);
    Halted { snapshot, failure }
}
