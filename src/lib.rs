// src/lib.rs
// SeriesGuide Stats - Local-first show and movie library with watch statistics
//
// Architecture:
// - Domain-centric: entities validate themselves before they are persisted
// - Event-driven: services coordinate through the event bus
// - Background statistics: one aggregation run at a time, off the caller's thread
// - Local-first: all data lives in a local SQLite file
// - Application Layer: command boundary used by the CLI

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    validate_episode,
    validate_movie,
    validate_show,
    watched_runtime,
    // Library
    Episode,
    EpisodeState,
    Movie,
    Show,
    ShowStatus,
    // Statistics
    EpisodeStats,
    MovieStats,
    ShowStats,
    StatisticsRecord,
    StatsEvent,
    StatsFailure,
    StatsSnapshot,
};

// ============================================================================
// PUBLIC API - Error Types & Config
// ============================================================================

pub use config::AppConfig;
pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    DomainEvent,
    EpisodeWatchedChanged,
    EventBus,
    EventLogEntry,
    MovieAdded,
    MovieWatchlistChanged,
    ShowAdded,
    StatisticsRebuilt,
    StatisticsRunFailed,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    EpisodeFilter,
    EpisodeRepository,
    MovieRepository,
    ShowRepository,
    SqliteEpisodeRepository,
    SqliteMovieRepository,
    SqliteShowRepository,
    SqliteStatisticsRepository,
    StatisticsRepository,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    // Library Service
    AddMovieRequest,
    AddShowRequest,
    LibraryService,
    NewEpisode,
    // Statistics
    CachedStatistics,
    StatisticsService,
    StatsObserver,
    StatsOptions,
    StatsRun,
    StatsSources,
    StatsTask,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::AppState;

// Re-export application submodules
pub use application::commands;
pub use application::dto;
