// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod episode;
pub mod movie;
pub mod show;
pub mod statistics;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Show Domain
pub use show::{validate_show, Show, ShowStatus};

// Episode Domain
pub use episode::{validate_episode, Episode, EpisodeState};

// Movie Domain
pub use movie::{validate_movie, Movie};

// Statistics Domain (Derived Data)
pub use statistics::{
    watched_runtime, EpisodeStats, MovieStats, ShowStats, StatisticsRecord, StatsEvent,
    StatsFailure, StatsSnapshot,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
