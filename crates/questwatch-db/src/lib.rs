//! Questwatch Database Layer
//!
//! Provides `SQLite` access for the persistent entity store. Uses `SQLx`
//! with embedded, versioned migrations.
//!
//! # Architecture
//!
//! - One module per table (`items`, `factions`, `zones`, `quests`,
//!   `instances`) exposing free functions over `&Pool<Sqlite>`
//! - Migrations are embedded and run automatically at startup
//! - Timestamps are stored as RFC 3339 TEXT in UTC
//! - All entity ids are the externally meaningful integers from the
//!   tracked page, never store-generated surrogates
//!
//! # Example
//!
//! ```ignore
//! use questwatch_db::Database;
//!
//! let db = Database::new("questwatch.db").await?;
//! db.run_migrations().await?;
//! let quests = questwatch_db::quests::get_all(db.pool()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod factions;
pub mod instances;
pub mod items;
pub mod migrations;
pub mod quests;
pub mod zones;

// Re-export commonly used types
pub use error::{DatabaseError, Result};
pub use factions::Faction;
pub use instances::QuestInstance;
pub use items::Item;
pub use quests::{Quest, QuestInit, UNCLASSIFIED_TYPE};
pub use zones::Zone;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// High-level database interface with pooling and migrations.
#[derive(Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) the store at the given path.
    ///
    /// `:memory:` opens an in-memory store, used by tests.
    ///
    /// # Errors
    /// Returns `DatabaseError::Open` if the database cannot be opened.
    pub async fn new(path: &str) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(path)
            .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
            .create_if_missing(true);

        // An in-memory database exists per connection; keep the pool at one
        // connection so every query sees the schema the migrations created.
        let max_connections = if path.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .map_err(|e| DatabaseError::Open(format!("failed to initialize pool: {e}")))?;

        tracing::info!("Database pool created at {}", path);

        Ok(Self { pool })
    }

    /// Run all pending database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version (number of applied migrations).
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying `SQLx` pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

/// Parse an RFC 3339 TEXT column into a UTC timestamp.
///
/// Shared by the table modules; surfaces malformed rows as decode errors
/// instead of silently substituting a timestamp.
pub(crate) fn parse_timestamp(
    column: &'static str,
    raw: &str,
) -> std::result::Result<chrono::DateTime<chrono::Utc>, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}
