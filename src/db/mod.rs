// src/db/mod.rs
//
// Database module
//
// Provides:
// - Connection pooling
// - Schema migrations
// - Database utilities

pub mod connection;
pub mod migrations;

pub use connection::{
    create_connection_pool, create_test_connection, get_connection, get_database_path,
    ConnectionPool, PooledConn,
};

pub use migrations::{
    get_database_stats, initialize_database, verify_database_integrity, DatabaseStats,
};

/// Opens a pool on a fresh database file inside a temp dir, schema applied.
/// The returned `TempDir` must outlive the pool.
#[cfg(test)]
pub(crate) fn create_test_pool() -> (tempfile::TempDir, std::sync::Arc<ConnectionPool>) {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_connection_pool(&dir.path().join("test.db")).unwrap();
    {
        let conn = pool.get().unwrap();
        initialize_database(&conn).unwrap();
    }
    (dir, std::sync::Arc::new(pool))
}
