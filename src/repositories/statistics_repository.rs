// src/repositories/statistics_repository.rs

use std::sync::Arc;
use rusqlite::{params, Row};

use crate::db::ConnectionPool;
use crate::domain::statistics::StatisticsRecord;
use crate::error::{AppError, AppResult};
use crate::repositories::row_codec::{invalid_data, parse_timestamp, parse_uuid};

#[cfg_attr(test, mockall::automock)]
pub trait StatisticsRepository: Send + Sync {
    fn save_record(&self, record: &StatisticsRecord) -> AppResult<()>;
    fn latest_record(&self) -> AppResult<Option<StatisticsRecord>>;
    fn delete_all(&self) -> AppResult<()>;
    /// Counter bumped by every write to shows, episodes or movies
    fn library_revision(&self) -> AppResult<i64>;
}

pub struct SqliteStatisticsRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteStatisticsRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &Row) -> Result<StatisticsRecord, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let snapshot_json: String = row.get("snapshot")?;
        let library_revision: i64 = row.get("library_revision")?;
        let generated_at_str: String = row.get("generated_at")?;

        let snapshot = serde_json::from_str(&snapshot_json)
            .map_err(|e| invalid_data(1, format!("Invalid snapshot JSON: {}", e)))?;

        Ok(StatisticsRecord {
            id: parse_uuid(0, &id_str)?,
            snapshot,
            library_revision,
            generated_at: parse_timestamp(3, &generated_at_str)?,
        })
    }
}

impl StatisticsRepository for SqliteStatisticsRepository {
    fn save_record(&self, record: &StatisticsRecord) -> AppResult<()> {
        let conn = self.pool.get()?;
        let snapshot_json = serde_json::to_string(&record.snapshot)?;

        conn.execute(
            "INSERT OR REPLACE INTO statistics_records (id, snapshot, library_revision, generated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id.to_string(),
                snapshot_json,
                record.library_revision,
                record.generated_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn latest_record(&self) -> AppResult<Option<StatisticsRecord>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, snapshot, library_revision, generated_at FROM statistics_records
             ORDER BY generated_at DESC LIMIT 1",
        )?;

        match stmt.query_row([], Self::row_to_record) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn delete_all(&self) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM statistics_records", [])?;
        Ok(())
    }

    fn library_revision(&self) -> AppResult<i64> {
        let conn = self.pool.get()?;
        let revision = conn.query_row(
            "SELECT revision FROM library_revision WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(revision)
    }
}
