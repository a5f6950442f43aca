//! # jotter-core
//!
//! Core types, traits, and abstractions for the jotter note service.
//!
//! This crate provides the domain models, the error taxonomy, the repository
//! traits that form the service boundary, and the change event bus that other
//! jotter crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{ChangeEvent, EventBus, EventEnvelope, TagChange};
pub use models::*;
pub use traits::*;
