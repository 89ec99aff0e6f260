//! Storage entity traits

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Key of a stored document
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// The key rendered as the backend's primary key column
    fn as_str(&self) -> &str;
}

/// A document that can be persisted by a `Storage` backend
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    type Key: StorageKey;

    fn key(&self) -> &Self::Key;
}
