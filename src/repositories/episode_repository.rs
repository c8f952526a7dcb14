// src/repositories/episode_repository.rs
//
// Episode Repository
//
// - All parse failures result in explicit conversion errors
// - Uses ConnectionPool for thread safety

use crate::db::ConnectionPool;
use crate::domain::episode::{entity::SPECIALS_SEASON, Episode, EpisodeState};
use crate::error::{AppError, AppResult};
use crate::repositories::row_codec::{invalid_data, non_negative, parse_timestamp, parse_uuid};
use rusqlite::{params, params_from_iter, Row};
use std::sync::Arc;
use uuid::Uuid;

/// Which episodes to count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpisodeFilter {
    /// Restrict to one show
    pub show_id: Option<Uuid>,
    /// Only episodes marked watched (skipped ones excluded)
    pub watched_only: bool,
    /// Leave out season 0
    pub exclude_specials: bool,
}

impl EpisodeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn watched() -> Self {
        Self {
            watched_only: true,
            ..Self::default()
        }
    }

    pub fn for_show(self, show_id: Uuid) -> Self {
        Self {
            show_id: Some(show_id),
            ..self
        }
    }

    pub fn excluding_specials(self, exclude: bool) -> Self {
        Self {
            exclude_specials: exclude,
            ..self
        }
    }

    /// Build the WHERE clause and its positional arguments
    fn to_sql(self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut args = Vec::new();

        if let Some(show_id) = self.show_id {
            args.push(show_id.to_string());
            clauses.push(format!("show_id = ?{}", args.len()));
        }
        if self.watched_only {
            args.push(EpisodeState::Watched.to_string());
            clauses.push(format!("state = ?{}", args.len()));
        }
        if self.exclude_specials {
            clauses.push(format!("season != {}", SPECIALS_SEASON));
        }

        if clauses.is_empty() {
            (String::new(), args)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), args)
        }
    }
}

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait EpisodeRepository: Send + Sync {
    fn save(&self, episode: &Episode) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Episode>>;

    fn list_by_show(&self, show_id: Uuid) -> AppResult<Vec<Episode>>;

    fn count(&self, filter: EpisodeFilter) -> AppResult<u64>;
}

pub struct SqliteEpisodeRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteEpisodeRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_episode(row: &Row) -> rusqlite::Result<Episode> {
        let id_str: String = row.get("id")?;
        let show_id_str: String = row.get("show_id")?;
        let season: i64 = row.get("season")?;
        let number: i64 = row.get("number")?;
        let state_str: String = row.get("state")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        let season = u32::try_from(non_negative(2, season)?)
            .map_err(|_| invalid_data(2, format!("Season {} out of range", season)))?;
        let number = u32::try_from(non_negative(3, number)?)
            .map_err(|_| invalid_data(3, format!("Episode number {} out of range", number)))?;
        let state = state_str
            .parse::<EpisodeState>()
            .map_err(|e| invalid_data(5, e))?;

        Ok(Episode {
            id: parse_uuid(0, &id_str)?,
            show_id: parse_uuid(1, &show_id_str)?,
            season,
            number,
            title: row.get("title")?,
            state,
            created_at: parse_timestamp(6, &created_at_str)?,
            updated_at: parse_timestamp(7, &updated_at_str)?,
        })
    }
}

impl EpisodeRepository for SqliteEpisodeRepository {
    fn save(&self, episode: &Episode) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT OR REPLACE INTO episodes (
                id, show_id, season, number, title, state, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                episode.id.to_string(),
                episode.show_id.to_string(),
                i64::from(episode.season),
                i64::from(episode.number),
                episode.title,
                episode.state.to_string(),
                episode.created_at.to_rfc3339(),
                episode.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Episode>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, show_id, season, number, title, state, created_at, updated_at
             FROM episodes WHERE id = ?1",
        )?;

        match stmt.query_row(params![id.to_string()], Self::row_to_episode) {
            Ok(episode) => Ok(Some(episode)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_by_show(&self, show_id: Uuid) -> AppResult<Vec<Episode>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, show_id, season, number, title, state, created_at, updated_at
             FROM episodes
             WHERE show_id = ?1
             ORDER BY season ASC, number ASC",
        )?;

        let episodes: Vec<Episode> = stmt
            .query_map(params![show_id.to_string()], Self::row_to_episode)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(episodes)
    }

    fn count(&self, filter: EpisodeFilter) -> AppResult<u64> {
        let conn = self.pool.get()?;

        let (where_clause, args) = filter.to_sql();
        let sql = format!("SELECT COUNT(*) FROM episodes{}", where_clause);

        let count: i64 = conn.query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))?;

        Ok(non_negative(0, count)?)
    }
}
