// src/repositories/movie_repository.rs

use std::sync::Arc;
use rusqlite::{params, Row};

use crate::db::ConnectionPool;
use crate::domain::movie::Movie;
use crate::error::{AppError, AppResult};
use crate::repositories::row_codec::{invalid_data, non_negative, parse_timestamp};

/// The projection of a movie the statistics flow needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieStatsRow {
    pub id: i64,
    pub in_watchlist: bool,
    pub runtime_minutes: u32,
}

#[cfg_attr(test, mockall::automock)]
pub trait MovieRepository: Send + Sync {
    fn save(&self, movie: &Movie) -> AppResult<()>;
    fn get_by_id(&self, id: i64) -> AppResult<Option<Movie>>;
    fn list_all(&self) -> AppResult<Vec<Movie>>;
    fn set_in_watchlist(&self, id: i64, in_watchlist: bool) -> AppResult<()>;
    fn list_stats_rows(&self) -> AppResult<Vec<MovieStatsRow>>;
}

pub struct SqliteMovieRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteMovieRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn parse_runtime(column: usize, raw: i64) -> rusqlite::Result<u32> {
        let value = non_negative(column, raw)?;
        u32::try_from(value)
            .map_err(|_| invalid_data(column, format!("Runtime {} out of range", value)))
    }

    fn row_to_movie(row: &Row) -> Result<Movie, rusqlite::Error> {
        let runtime: i64 = row.get("runtime_minutes")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        Ok(Movie {
            id: row.get("id")?,
            title: row.get("title")?,
            in_watchlist: row.get("in_watchlist")?,
            runtime_minutes: Self::parse_runtime(3, runtime)?,
            created_at: parse_timestamp(4, &created_at_str)?,
            updated_at: parse_timestamp(5, &updated_at_str)?,
        })
    }
}

impl MovieRepository for SqliteMovieRepository {
    fn save(&self, movie: &Movie) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT OR REPLACE INTO movies (
                id, title, in_watchlist, runtime_minutes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                movie.id,
                movie.title,
                movie.in_watchlist,
                i64::from(movie.runtime_minutes),
                movie.created_at.to_rfc3339(),
                movie.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn get_by_id(&self, id: i64) -> AppResult<Option<Movie>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, in_watchlist, runtime_minutes, created_at, updated_at
             FROM movies WHERE id = ?1",
        )?;

        match stmt.query_row(params![id], Self::row_to_movie) {
            Ok(movie) => Ok(Some(movie)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_all(&self) -> AppResult<Vec<Movie>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, in_watchlist, runtime_minutes, created_at, updated_at
             FROM movies
             ORDER BY title",
        )?;

        let movies: Vec<Movie> = stmt
            .query_map([], Self::row_to_movie)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(movies)
    }

    fn set_in_watchlist(&self, id: i64, in_watchlist: bool) -> AppResult<()> {
        let conn = self.pool.get()?;

        let rows_affected = conn.execute(
            "UPDATE movies SET in_watchlist = ?1, updated_at = ?2 WHERE id = ?3",
            params![in_watchlist, chrono::Utc::now().to_rfc3339(), id],
        )?;

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    fn list_stats_rows(&self) -> AppResult<Vec<MovieStatsRow>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT id, in_watchlist, runtime_minutes FROM movies")?;

        let rows: Vec<MovieStatsRow> = stmt
            .query_map([], |row| {
                let runtime: i64 = row.get(2)?;
                Ok(MovieStatsRow {
                    id: row.get(0)?,
                    in_watchlist: row.get(1)?,
                    runtime_minutes: Self::parse_runtime(2, runtime)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[test]
    fn test_save_get_and_toggle_watchlist() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteMovieRepository::new(pool);

        let movie = Movie::new(155, "The Dark Knight".to_string(), 152);
        repo.save(&movie).unwrap();
        assert!(!repo.get_by_id(155).unwrap().unwrap().in_watchlist);

        repo.set_in_watchlist(155, true).unwrap();
        let loaded = repo.get_by_id(155).unwrap().unwrap();
        assert!(loaded.in_watchlist);
        assert_eq!(loaded.runtime_minutes, 152);

        assert!(matches!(repo.set_in_watchlist(1, true), Err(AppError::NotFound)));
    }

    #[test]
    fn test_stats_rows() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteMovieRepository::new(pool);

        let mut watchlisted = Movie::new(27205, "Inception".to_string(), 148);
        watchlisted.set_in_watchlist(true);
        repo.save(&watchlisted).unwrap();
        repo.save(&Movie::new(680, "Pulp Fiction".to_string(), 154)).unwrap();

        let mut rows = repo.list_stats_rows().unwrap();
        rows.sort_by_key(|row| row.id);

        assert_eq!(
            rows,
            vec![
                MovieStatsRow { id: 680, in_watchlist: false, runtime_minutes: 154 },
                MovieStatsRow { id: 27205, in_watchlist: true, runtime_minutes: 148 },
            ]
        );
    }
}
