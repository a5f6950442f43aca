//! Structured logging schema, field name constants, and subscriber bootstrap.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, slow query, pool exhaustion |
//! | INFO  | Lifecycle events (pool created, migrations), completed mutations |
//! | DEBUG | Decision points, query result counts |
//! | TRACE | Per-item iteration (per-note scores) |
//!
//! ## Standard fields
//!
//! Event macros take literal field names, so these are written inline:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `subsystem` | "database" or "search" |
//! | `component` | "pool", "notes", "tags", "scorer", "session" |
//! | `op` | Logical operation, e.g. "create", "associate", "score" |
//! | `note_id`, `tag_id` | Entity being operated on |
//! | `pool_size`, `pool_idle` | Connection pool occupancy |
//! | `slow` | Set when a query exceeds the slow threshold |
//!
//! Measurements known only once an instrumented operation finishes are
//! declared `field::Empty` on its span and filled in with
//! `Span::current().record(..)` using the constants below.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Error, Result};

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of parallel scoring workers.
pub const WORKER_COUNT: &str = "worker_count";

// ─── Subscriber bootstrap ──────────────────────────────────────────────────

/// Output format for the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse `LOG_FORMAT` values; anything other than `json` is text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    /// Read `LOG_FORMAT` from the environment.
    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|v| Self::parse(&v))
            .unwrap_or(LogFormat::Text)
    }
}

/// Install the global tracing subscriber for a host application.
///
/// `RUST_LOG` overrides `default_filter`. Fails if a subscriber is already set.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    result.map_err(|e| Error::Config(format!("failed to install tracing subscriber: {}", e)))
}
