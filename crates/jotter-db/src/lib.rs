//! # jotter-db
//!
//! PostgreSQL database layer for jotter.
//!
//! This crate provides:
//! - Connection pool management and environment configuration
//! - Note repository with eager, de-duplicated tag loading
//! - Tag repository with case-insensitive names and transactional cascades
//! - Embedded schema migrations
//!
//! ## Example
//!
//! ```rust,ignore
//! use jotter_db::{CreateNoteRequest, Database, DbConfig, NoteRepository, TagRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect_with_config(DbConfig::from_env()?).await?;
//!     db.migrate().await?;
//!
//!     let note = db.notes.create(CreateNoteRequest::new("Hello", "world")).await?;
//!     let tag = db.tags.get_or_create("greeting").await?;
//!     db.tags.associate(note.id, tag.id).await?;
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod notes;
pub mod pool;
pub mod tags;

// Test fixtures for integration tests
// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use std::time::Instant;

use tracing::{debug, warn};

// Re-export core types
pub use jotter_core::*;

pub use config::DbConfig;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tags::{validate_tag_name, PgTagRepository};

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Log the duration of a repository query, warning when it is slow.
pub(crate) fn log_query(component: &'static str, op: &'static str, start: Instant, rows: usize) {
    let duration_ms = start.elapsed().as_millis() as u64;
    if duration_ms >= jotter_core::defaults::SLOW_QUERY_THRESHOLD_MS {
        warn!(
            subsystem = "database",
            component,
            op,
            result_count = rows,
            duration_ms,
            slow = true,
            "Slow query"
        );
    } else {
        debug!(
            subsystem = "database",
            component,
            op,
            result_count = rows,
            duration_ms,
            "Query complete"
        );
    }
}

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository for CRUD operations.
    pub notes: PgNoteRepository,
    /// Tag repository for tags and note/tag associations.
    pub tags: PgTagRepository,
    /// Change notifications emitted by the note and tag repositories.
    pub events: EventBus,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self::with_event_bus(pool, EventBus::default())
    }

    /// Create a Database that publishes change events on an existing bus.
    pub fn with_event_bus(pool: sqlx::Pool<sqlx::Postgres>, events: EventBus) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone(), events.clone()),
            tags: PgTagRepository::new(pool.clone(), events.clone()),
            events,
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Connect using a loaded configuration.
    pub async fn connect_with_config(config: DbConfig) -> Result<Self> {
        let pool = create_pool_with_config(&config.database_url, config.pool).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        let start = Instant::now();
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        tracing::info!(
            subsystem = "database",
            op = "migrate",
            duration_ms = start.elapsed().as_millis() as u64,
            "Migrations applied"
        );
        log_pool_metrics(&self.pool);
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Subscribe to tag-change notifications.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }
}
