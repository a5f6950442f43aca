//! Centralized default constants for jotter.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// DATABASE POOL
// =============================================================================

/// Maximum number of connections in the pool.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Minimum number of connections kept open.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Connection acquire timeout in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Idle connection timeout in seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Maximum connection lifetime in seconds (30 minutes).
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// TAGS
// =============================================================================

/// Maximum tag name length in characters.
pub const TAG_NAME_MAX_LEN: usize = 100;

// =============================================================================
// SEARCH SCORING
// =============================================================================

/// Points awarded when the title contains the query.
pub const SCORE_TITLE_MATCH: u32 = 2;

/// Points awarded when the content contains the query.
pub const SCORE_CONTENT_MATCH: u32 = 1;

/// Worker count used when available parallelism cannot be determined.
pub const SCORER_FALLBACK_WORKERS: usize = 4;

// =============================================================================
// EVENTS
// =============================================================================

/// Broadcast buffer for the change event bus.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// LOGGING
// =============================================================================

/// Operations slower than this are logged at WARN.
pub const SLOW_QUERY_THRESHOLD_MS: u64 = 500;

/// Filter used when `RUST_LOG` is not set.
pub const LOG_FILTER: &str = "jotter_core=info,jotter_db=info,jotter_search=info";
