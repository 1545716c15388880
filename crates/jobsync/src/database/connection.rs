/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Database connection management for the SQLite store.
//!
//! This module provides an async connection pool using `deadpool-diesel`.
//! Blocking diesel calls are run through `interact`, which moves them onto
//! the pool's blocking thread so the async runtime is never stalled.
//!
//! # Example
//!
//! ```rust,ignore
//! use jobsync::database::Database;
//!
//! let db = Database::try_new("sqlite:///var/lib/jobsync/jobsync.db")?;
//! db.run_migrations().await?;
//! ```

use deadpool_diesel::sqlite::{Manager as SqliteManager, Pool as SqlitePool, Runtime};
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use tracing::info;

use crate::error::StoreError;

/// Pooled SQLite connection handle.
pub type PooledConnection = deadpool::managed::Object<SqliteManager>;

/// SQLite busy timeout applied before migrations, in milliseconds.
const BUSY_TIMEOUT_MS: u32 = 30_000;

/// A pool of SQLite connections.
///
/// `Database` is `Clone`; every clone shares the same pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    url: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("url", &self.url).finish()
    }
}

impl Database {
    /// Creates a pool for the given connection string.
    ///
    /// Accepts a `sqlite://` URL, a plain file path, `:memory:` or a
    /// `file:` URI. An empty string is rejected.
    pub fn try_new(connection_string: &str) -> Result<Self, StoreError> {
        let url = Self::build_sqlite_url(connection_string)?;
        let manager = SqliteManager::new(url.clone(), Runtime::Tokio1);

        // SQLite has limited concurrent write support even with WAL mode.
        // A single connection avoids "database is locked" errors and keeps
        // `:memory:` databases from splitting across connections.
        let sqlite_pool_size = 1;
        let pool = SqlitePool::builder(manager)
            .max_size(sqlite_pool_size)
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        info!(
            "SQLite connection pool initialized (size: {})",
            sqlite_pool_size
        );

        Ok(Self { pool, url })
    }

    /// The normalised connection URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Checks a connection out of the pool.
    pub async fn get_connection(&self) -> Result<PooledConnection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))
    }

    /// Runs pending migrations after configuring WAL mode and a busy timeout.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        let conn = self.get_connection().await?;
        conn.interact(|conn| -> Result<(), String> {
            // WAL mode allows concurrent reads during writes
            diesel::sql_query("PRAGMA journal_mode=WAL;")
                .execute(conn)
                .map_err(|e| format!("Failed to set WAL mode: {}", e))?;
            diesel::sql_query(format!("PRAGMA busy_timeout={};", BUSY_TIMEOUT_MS))
                .execute(conn)
                .map_err(|e| format!("Failed to set busy_timeout: {}", e))?;
            conn.run_pending_migrations(crate::database::SQLITE_MIGRATIONS)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| StoreError::ConnectionPool(e.to_string()))?
        .map_err(StoreError::Migration)?;

        info!("Database migrations applied");
        Ok(())
    }

    fn build_sqlite_url(connection_string: &str) -> Result<String, StoreError> {
        let trimmed = connection_string.trim();
        let url = trimmed.strip_prefix("sqlite://").unwrap_or(trimmed);
        if url.is_empty() {
            return Err(StoreError::Configuration(
                "database URL must not be empty".to_string(),
            ));
        }
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Err(StoreError::Configuration(format!(
                "unsupported database URL '{}': only SQLite is supported",
                connection_string
            )));
        }
        Ok(url.to_string())
    }
}
