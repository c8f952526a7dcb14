use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked movie, keyed by its TMDb id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    /// TMDb identifier
    pub id: i64,

    pub title: String,

    /// Whether the user plans to watch it
    pub in_watchlist: bool,

    /// Runtime in minutes (0 if unknown)
    pub runtime_minutes: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    pub fn new(id: i64, title: String, runtime_minutes: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            in_watchlist: false,
            runtime_minutes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_in_watchlist(&mut self, in_watchlist: bool) {
        self.in_watchlist = in_watchlist;
        self.updated_at = Utc::now();
    }
}
