//! Storage infrastructure - Storage implementations

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{StorageBackend, StorageFactory, Stores};
pub use in_memory::InMemoryStorage;
pub use migrations::run_storage_migrations;
pub use postgres::{PostgresConfig, PostgresStorage};
