// src/repositories/row_codec.rs
//
// Column parsing shared by the SQLite repositories.
// Every parse failure is an explicit conversion error, never a silent default.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub(crate) fn invalid_data(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

pub(crate) fn parse_uuid(column: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| invalid_data(column, format!("Invalid UUID '{}': {}", raw, e)))
}

pub(crate) fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| invalid_data(column, format!("Invalid timestamp '{}': {}", raw, e)))
}

/// SQLite stores integers as i64; negative values here mean a corrupt row
pub(crate) fn non_negative(column: usize, value: i64) -> rusqlite::Result<u64> {
    u64::try_from(value)
        .map_err(|_| invalid_data(column, format!("Expected non-negative value, got {}", value)))
}
