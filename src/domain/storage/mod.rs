//! Storage domain - Generic document storage abstraction
//!
//! Workflows and audit entries are persisted as JSON documents keyed by a
//! string identifier. Backends live in `infrastructure::storage`.

mod entity;
mod repository;

pub use entity::{StorageEntity, StorageKey};
pub use repository::{EntityFilter, Storage};
