//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Predicate used by bulk deletes
pub type EntityFilter<'a, E> = &'a (dyn Fn(&E) -> bool + Send + Sync);

/// Generic storage trait for CRUD operations on any entity type
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves all entities
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Creates a new entity, returns error if already exists
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Updates an existing entity, returns error if not found
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Deletes an entity by its key, returns true if deleted
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    /// Deletes every entity matching `filter`, returns how many were removed
    async fn delete_where(&self, filter: EntityFilter<'_, E>) -> Result<usize, DomainError> {
        let matching: Vec<E> = self
            .list()
            .await?
            .into_iter()
            .filter(|entity| filter(entity))
            .collect();

        let mut deleted = 0;

        for entity in &matching {
            if self.delete(entity.key()).await? {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the count of entities
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }
}
