// src/events/mod.rs
//
// Internal Event System - Public API
//
// CRITICAL: the type-erased handler alias is INTERNAL and must NOT be exported

pub mod bus;
pub mod types;

pub use types::DomainEvent;

pub use types::{
    // Library
    EpisodeWatchedChanged,
    MovieAdded,
    MovieWatchlistChanged,
    ShowAdded,
    // Statistics
    StatisticsRebuilt,
    StatisticsRunFailed,
};

pub use bus::{EventBus, EventLogEntry};

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
