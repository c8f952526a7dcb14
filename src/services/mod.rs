// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod library_service;
pub mod statistics_service;
pub mod stats_task;

pub use library_service::{AddMovieRequest, AddShowRequest, LibraryService, NewEpisode};

pub use statistics_service::{CachedStatistics, StatisticsService, StatsObserver, StatsRun};

pub use stats_task::{StatsOptions, StatsSources, StatsTask, DEFAULT_PUBLISH_INTERVAL};
