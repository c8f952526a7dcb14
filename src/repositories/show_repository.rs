// src/repositories/show_repository.rs

use std::sync::Arc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::episode::{Episode, EpisodeState};
use crate::domain::show::{Show, ShowStatus};
use crate::error::{AppError, AppResult};
use crate::repositories::row_codec::{invalid_data, non_negative, parse_timestamp, parse_uuid};

/// The projection of a show the statistics flow needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowStatsRow {
    pub id: Uuid,
    pub status: ShowStatus,
    pub has_next_episode: bool,
    pub runtime_minutes: u32,
}

#[cfg_attr(test, mockall::automock)]
pub trait ShowRepository: Send + Sync {
    fn save(&self, show: &Show) -> AppResult<()>;

    /// Saves a new show and its episodes in one transaction
    fn save_with_episodes(&self, show: &Show, episodes: &[Episode]) -> AppResult<()>;

    /// Sets an episode's state and the show's next episode together.
    /// `NotFound` when the episode does not belong to the show.
    fn apply_episode_state(
        &self,
        show_id: Uuid,
        episode_id: Uuid,
        state: EpisodeState,
        next_episode: Option<Uuid>,
    ) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Show>>;
    fn list_all(&self) -> AppResult<Vec<Show>>;
    fn list_stats_rows(&self) -> AppResult<Vec<ShowStatsRow>>;
    fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct SqliteShowRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteShowRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn parse_status(column: usize, raw: &str) -> rusqlite::Result<ShowStatus> {
        raw.parse::<ShowStatus>().map_err(|e| invalid_data(column, e))
    }

    fn parse_runtime(column: usize, raw: i64) -> rusqlite::Result<u32> {
        let value = non_negative(column, raw)?;
        u32::try_from(value)
            .map_err(|_| invalid_data(column, format!("Runtime {} out of range", value)))
    }

    fn upsert(conn: &Connection, show: &Show) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO shows (
                id, title, status, next_episode, runtime_minutes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                status = excluded.status,
                next_episode = excluded.next_episode,
                runtime_minutes = excluded.runtime_minutes,
                updated_at = excluded.updated_at",
            params![
                show.id.to_string(),
                show.title,
                show.status.to_string(),
                show.next_episode.map(|id| id.to_string()),
                i64::from(show.runtime_minutes),
                show.created_at.to_rfc3339(),
                show.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn row_to_show(row: &Row) -> Result<Show, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let status_str: String = row.get("status")?;
        let next_episode_str: Option<String> = row.get("next_episode")?;
        let runtime: i64 = row.get("runtime_minutes")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        Ok(Show {
            id: parse_uuid(0, &id_str)?,
            title: row.get("title")?,
            status: Self::parse_status(2, &status_str)?,
            next_episode: next_episode_str
                .as_deref()
                .map(|raw| parse_uuid(3, raw))
                .transpose()?,
            runtime_minutes: Self::parse_runtime(4, runtime)?,
            created_at: parse_timestamp(5, &created_at_str)?,
            updated_at: parse_timestamp(6, &updated_at_str)?,
        })
    }

    fn row_to_stats_row(row: &Row) -> Result<ShowStatsRow, rusqlite::Error> {
        let id_str: String = row.get(0)?;
        let status_str: String = row.get(1)?;
        let has_next_episode: bool = row.get(2)?;
        let runtime: i64 = row.get(3)?;

        Ok(ShowStatsRow {
            id: parse_uuid(0, &id_str)?,
            status: Self::parse_status(1, &status_str)?,
            has_next_episode,
            runtime_minutes: Self::parse_runtime(3, runtime)?,
        })
    }
}

impl ShowRepository for SqliteShowRepository {
    fn save(&self, show: &Show) -> AppResult<()> {
        let conn = self.pool.get()?;
        Self::upsert(&conn, show)?;
        Ok(())
    }

    fn save_with_episodes(&self, show: &Show, episodes: &[Episode]) -> AppResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        Self::upsert(&tx, show)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO episodes (
                    id, show_id, season, number, title, state, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for episode in episodes {
                stmt.execute(params![
                    episode.id.to_string(),
                    episode.show_id.to_string(),
                    i64::from(episode.season),
                    i64::from(episode.number),
                    episode.title,
                    episode.state.to_string(),
                    episode.created_at.to_rfc3339(),
                    episode.updated_at.to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;
        log::debug!("Saved show {} with {} episodes", show.id, episodes.len());
        Ok(())
    }

    fn apply_episode_state(
        &self,
        show_id: Uuid,
        episode_id: Uuid,
        state: EpisodeState,
        next_episode: Option<Uuid>,
    ) -> AppResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().to_rfc3339();

        let rows_affected = tx.execute(
            "UPDATE episodes SET state = ?1, updated_at = ?2 WHERE id = ?3 AND show_id = ?4",
            params![state.to_string(), now, episode_id.to_string(), show_id.to_string()],
        )?;
        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        let rows_affected = tx.execute(
            "UPDATE shows SET next_episode = ?1, updated_at = ?2 WHERE id = ?3",
            params![next_episode.map(|id| id.to_string()), now, show_id.to_string()],
        )?;
        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Show>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, status, next_episode, runtime_minutes, created_at, updated_at
             FROM shows WHERE id = ?1",
        )?;

        match stmt.query_row(params![id.to_string()], Self::row_to_show) {
            Ok(show) => Ok(Some(show)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_all(&self) -> AppResult<Vec<Show>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, status, next_episode, runtime_minutes, created_at, updated_at
             FROM shows
             ORDER BY title",
        )?;

        let shows: Vec<Show> = stmt
            .query_map([], Self::row_to_show)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(shows)
    }

    fn list_stats_rows(&self) -> AppResult<Vec<ShowStatsRow>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, status, next_episode IS NOT NULL, runtime_minutes FROM shows",
        )?;

        let rows: Vec<ShowStatsRow> = stmt
            .query_map([], Self::row_to_stats_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn delete(&self, id: Uuid) -> AppResult<()> {
        let conn = self.pool.get()?;

        let rows_affected = conn.execute("DELETE FROM shows WHERE id = ?1", params![id.to_string()])?;

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
