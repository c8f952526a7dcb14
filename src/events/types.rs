// src/events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{EpisodeState, StatsFailure, StatsSnapshot};

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// LIBRARY EVENTS
// ============================================================================

/// Emitted when a new Show is added to the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowAdded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub show_id: Uuid,
    pub title: String,
    pub episode_count: usize,
}

impl ShowAdded {
    pub fn new(show_id: Uuid, title: String, episode_count: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            show_id,
            title,
            episode_count,
        }
    }
}

impl DomainEvent for ShowAdded {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ShowAdded" }
}

/// Emitted when a new Movie is added to the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieAdded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub movie_id: i64,
    pub title: String,
}

impl MovieAdded {
    pub fn new(movie_id: i64, title: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            movie_id,
            title,
        }
    }
}

impl DomainEvent for MovieAdded {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "MovieAdded" }
}

/// Emitted when an episode's watch state changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeWatchedChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub show_id: Uuid,
    pub episode_id: Uuid,
    pub state: EpisodeState,
}

impl EpisodeWatchedChanged {
    pub fn new(show_id: Uuid, episode_id: Uuid, state: EpisodeState) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            show_id,
            episode_id,
            state,
        }
    }
}

impl DomainEvent for EpisodeWatchedChanged {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "EpisodeWatchedChanged" }
}

/// Emitted when a movie is put on or taken off the watchlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieWatchlistChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub movie_id: i64,
    pub in_watchlist: bool,
}

impl MovieWatchlistChanged {
    pub fn new(movie_id: i64, in_watchlist: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            movie_id,
            in_watchlist,
        }
    }
}

impl DomainEvent for MovieWatchlistChanged {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "MovieWatchlistChanged" }
}

// ============================================================================
// STATISTICS EVENTS
// ============================================================================

/// Emitted when a statistics run completes every step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsRebuilt {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub snapshot: StatsSnapshot,
}

impl StatisticsRebuilt {
    pub fn new(snapshot: StatsSnapshot) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            snapshot,
        }
    }
}

impl DomainEvent for StatisticsRebuilt {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "StatisticsRebuilt" }
}

/// Emitted when a statistics run stops early
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsRunFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub failure: StatsFailure,
}

impl StatisticsRunFailed {
    pub fn new(failure: StatsFailure) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            failure,
        }
    }
}

impl DomainEvent for StatisticsRunFailed {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "StatisticsRunFailed" }
}
