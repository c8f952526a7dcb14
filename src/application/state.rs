// src/application/state.rs

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::ConnectionPool;
use crate::events::EventBus;
use crate::repositories::{
    SqliteEpisodeRepository, SqliteMovieRepository, SqliteShowRepository,
    SqliteStatisticsRepository,
};
use crate::services::{LibraryService, StatisticsService, StatsSources};

/// Application state shared by every command.
/// All fields are Arc-wrapped for thread-safe sharing.
pub struct AppState {
    pub config: AppConfig,
    pub event_bus: Arc<EventBus>,
    pub library_service: Arc<LibraryService>,
    pub statistics_service: Arc<StatisticsService>,
}

impl AppState {
    /// Wire repositories and services over an initialized pool
    pub fn new(pool: Arc<ConnectionPool>, config: AppConfig) -> Self {
        let event_bus = Arc::new(EventBus::new());

        let show_repo = Arc::new(SqliteShowRepository::new(Arc::clone(&pool)));
        let episode_repo = Arc::new(SqliteEpisodeRepository::new(Arc::clone(&pool)));
        let movie_repo = Arc::new(SqliteMovieRepository::new(Arc::clone(&pool)));
        let statistics_repo = Arc::new(SqliteStatisticsRepository::new(pool));

        let library_service = Arc::new(LibraryService::new(
            show_repo.clone(),
            episode_repo.clone(),
            movie_repo.clone(),
            Arc::clone(&event_bus),
        ));

        let statistics_service = Arc::new(StatisticsService::new(
            StatsSources {
                shows: show_repo,
                episodes: episode_repo,
                movies: movie_repo,
            },
            statistics_repo,
            Arc::clone(&event_bus),
            config.stats_options(),
        ));

        log::debug!("Application state ready");

        Self {
            config,
            event_bus,
            library_service,
            statistics_service,
        }
    }
}
