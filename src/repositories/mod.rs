// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO event emission
// - NO cross-repository calls
// - Explicit SQL only

pub mod episode_repository;
pub mod movie_repository;
pub(crate) mod row_codec;
pub mod show_repository;
pub mod statistics_repository;

pub use episode_repository::{EpisodeFilter, EpisodeRepository, SqliteEpisodeRepository};
pub use movie_repository::{MovieRepository, MovieStatsRow, SqliteMovieRepository};
pub use show_repository::{ShowRepository, ShowStatsRow, SqliteShowRepository};
pub use statistics_repository::{SqliteStatisticsRepository, StatisticsRepository};

#[cfg(test)]
pub use episode_repository::MockEpisodeRepository;
#[cfg(test)]
pub use movie_repository::MockMovieRepository;
#[cfg(test)]
pub use show_repository::MockShowRepository;
#[cfg(test)]
pub use statistics_repository::MockStatisticsRepository;
