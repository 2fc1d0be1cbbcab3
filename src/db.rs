//! Database connection pooling and schema bootstrap
//!
//! Owns the SQLite connection pool. Every pooled connection gets foreign keys
//! enabled and the `similarity` scalar function registered before it is handed
//! out, so search SQL works on any connection without per-call setup.

use std::fs;
use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::info;

use crate::error::{ApiError, Result};
use crate::search::register_similarity;

/// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
/// Type alias for a pooled connection (released to the pool on drop)
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database manager for handling connections and migrations
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database connection pool with default pool settings.
    pub fn new(database_path: &str) -> Result<Self> {
        Self::with_pool_options(database_path, 10, Duration::from_secs(30))
    }

    /// Create a new database connection pool with explicit pool settings.
    pub fn with_pool_options(
        database_path: &str,
        max_connections: u32,
        connection_timeout: Duration,
    ) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            register_similarity(conn)
        });

        let pool = Pool::builder()
            .max_size(max_connections)
            .connection_timeout(connection_timeout)
            .build(manager)?;

        // Run migrations
        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        info!(path = database_path, max_connections, "database ready");
        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!(
            "../migrations/2025-07-12-000000_create_analytics_tables/up.sql"
        ))
        .map_err(|e| {
            ApiError::Internal(format!("Failed to run analytics tables migration: {e}"))
        })?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Number of connections currently held by the pool
    pub fn pool_size(&self) -> u32 {
        self.pool.state().connections
    }
}
