//! Entity service
//!
//! One [`EntityService`] per entity type applies the create / update /
//! list / get / delete operations to the primary store and mirrors every
//! mutation into the search index.
//!
//! # Dual writes
//!
//! The primary store is written first. The index is written second and a
//! failed index write does not fail the request: it is logged, and the
//! divergence is repaired by [`EntityService::reindex`], which rebuilds the
//! index from the primary store.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use core_kernel::{Entity, EntityPort, SearchPort};

use crate::error::DomainError;

pub struct EntityService<E: Entity> {
    repository: Arc<dyn EntityPort<E>>,
    search: Arc<dyn SearchPort<E>>,
}

impl<E: Entity> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            search: Arc::clone(&self.search),
        }
    }
}

impl<E> EntityService<E>
where
    E: Entity + Validate,
{
    /// Creates a service over a primary store and its search mirror
    pub fn new(repository: Arc<dyn EntityPort<E>>, search: Arc<dyn SearchPort<E>>) -> Self {
        Self { repository, search }
    }

    /// Persists a new entity and indexes it
    ///
    /// # Errors
    ///
    /// * `IdExists` if the entity already carries an id
    /// * `Validation` if a field violates its constraints
    #[instrument(skip_all, fields(entity = E::ENTITY_NAME))]
    pub async fn create(&self, entity: E) -> Result<E, DomainError> {
        debug!("Request to save {} : {:?}", E::ENTITY_NAME, entity);
        if entity.id().is_some() {
            return Err(DomainError::IdExists {
                entity: E::ENTITY_NAME,
            });
        }
        Self::validate(&entity)?;

        let saved = self.repository.save(entity).await?;
        self.mirror(&saved).await;
        Ok(saved)
    }

    /// Overwrites an existing entity and re-indexes it
    ///
    /// # Errors
    ///
    /// * `IdNull` if the entity carries no id
    /// * `Validation` if a field violates its constraints
    /// * `NotFound` if no entity with that id is stored
    #[instrument(skip_all, fields(entity = E::ENTITY_NAME))]
    pub async fn update(&self, entity: E) -> Result<E, DomainError> {
        debug!("Request to update {} : {:?}", E::ENTITY_NAME, entity);
        let id = entity.id().ok_or(DomainError::IdNull {
            entity: E::ENTITY_NAME,
        })?;
        Self::validate(&entity)?;

        if !self.repository.exists(id).await? {
            return Err(DomainError::not_found(E::ENTITY_NAME, id));
        }

        let saved = self.repository.save(entity).await?;
        self.mirror(&saved).await;
        Ok(saved)
    }

    /// Every stored entity, ordered by id
    pub async fn find_all(&self) -> Result<Vec<E>, DomainError> {
        debug!("Request to get all {}", E::ENTITY_NAME);
        Ok(self.repository.find_all().await?)
    }

    pub async fn find_one(&self, id: E::Id) -> Result<E, DomainError> {
        debug!("Request to get {} : {}", E::ENTITY_NAME, id);
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(E::ENTITY_NAME, id))
    }

    /// Deletes from the primary store, then from the index
    ///
    /// Deleting an id that does not exist is not an error. Returns whether a
    /// stored entity was removed.
    #[instrument(skip(self), fields(entity = E::ENTITY_NAME))]
    pub async fn delete(&self, id: E::Id) -> Result<bool, DomainError> {
        debug!("Request to delete {} : {}", E::ENTITY_NAME, id);
        let removed = self.repository.delete_by_id(id).await?;
        if let Err(e) = self.search.remove(id).await {
            warn!(error = %e, %id, "Failed to remove {} from search index", E::ENTITY_NAME);
        }
        Ok(removed)
    }

    /// Passes a query string through to the search index
    pub async fn search(&self, query: &str) -> Result<Vec<E>, DomainError> {
        debug!("Request to search for a page of {} for query {}", E::ENTITY_NAME, query);
        Ok(self.search.search(query).await?)
    }

    /// Rebuilds the search index from the primary store
    ///
    /// Every stored entity is re-indexed in place, then documents whose row
    /// no longer exists are dropped. The index is never emptied along the
    /// way, and the primary store is read again after indexing so a row
    /// deleted mid-rebuild does not survive in the index.
    ///
    /// Returns the number of indexed entities.
    #[instrument(skip(self), fields(entity = E::ENTITY_NAME))]
    pub async fn reindex(&self) -> Result<usize, DomainError> {
        let all = self.repository.find_all().await?;
        for entity in &all {
            self.search.index(entity).await?;
        }

        let live: BTreeSet<E::Id> = self
            .repository
            .find_all()
            .await?
            .iter()
            .filter_map(Entity::id)
            .collect();
        self.search.retain(&live).await?;

        info!(count = all.len(), live = live.len(), "Reindexed {}", E::ENTITY_NAME);
        Ok(all.len())
    }

    async fn mirror(&self, entity: &E) {
        if let Err(e) = self.search.index(entity).await {
            warn!(
                error = %e,
                id = ?entity.id(),
                "Failed to index {}; search results will be stale until reindex",
                E::ENTITY_NAME
            );
        }
    }

    fn validate(entity: &E) -> Result<(), DomainError> {
        entity
            .validate()
            .map_err(|errors| DomainError::validation(E::ENTITY_NAME, &errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{InMemoryEntityPort, RecordingSearchPort};
    use crate::{Device, Temperature};
    use core_kernel::{DeviceId, PortError, TemperatureId};

    fn service<E: Entity + Validate>() -> (
        EntityService<E>,
        Arc<InMemoryEntityPort<E>>,
        Arc<RecordingSearchPort<E>>,
    ) {
        let repo = Arc::new(InMemoryEntityPort::new());
        let search = Arc::new(RecordingSearchPort::new());
        (EntityService::new(repo.clone(), search.clone()), repo, search)
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_indexes() {
        let (service, repo, search) = service::<Device>();

        let created = service
            .create(Device::new().with_uuid("AAAAAAAAAA"))
            .await
            .unwrap();

        let id = created.id.expect("id assigned");
        assert_eq!(repo.len().await, 1);
        assert_eq!(search.indexed_ids().await, vec![id]);
    }

    #[tokio::test]
    async fn test_create_with_existing_id_is_rejected() {
        let (service, repo, search) = service::<Device>();

        let err = service
            .create(Device::new().with_id(DeviceId::new(1)))
            .await
            .unwrap_err();

        assert_eq!(err.error_key(), "idexists");
        assert_eq!(repo.len().await, 0);
        assert!(search.indexed_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_without_id_is_rejected() {
        let (service, _repo, search) = service::<Temperature>();

        let err = service.update(Temperature::new()).await.unwrap_err();

        assert_eq!(err.error_key(), "idnull");
        assert!(search.indexed_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let (service, repo, _search) = service::<Temperature>();

        let err = service
            .update(Temperature::new().with_id(TemperatureId::new(99)))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_update_overwrites_and_reindexes() {
        let (service, _repo, search) = service::<Temperature>();
        let created = service
            .create(Temperature::new().with_name("AAAAAAAAAA"))
            .await
            .unwrap();

        let mut changed = created.clone();
        changed.name = Some("BBBBBBBBBB".to_string());
        service.update(changed).await.unwrap();

        let stored = service.find_one(created.id.unwrap()).await.unwrap();
        assert_eq!(stored.name.as_deref(), Some("BBBBBBBBBB"));
        assert_eq!(search.index_calls().await, 2);
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let (service, repo, search) = service::<Device>();

        let err = service
            .create(Device::new().with_uuid("u".repeat(300)))
            .await
            .unwrap_err();

        assert_eq!(err.error_key(), "validation");
        assert_eq!(repo.len().await, 0);
        assert_eq!(search.index_calls().await, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_from_both_stores() {
        let (service, repo, search) = service::<Device>();
        let created = service.create(Device::new()).await.unwrap();
        let id = created.id.unwrap();

        assert!(service.delete(id).await.unwrap());
        assert_eq!(repo.len().await, 0);
        assert_eq!(search.removed_ids().await, vec![id]);

        // deleting again is not an error
        assert!(!service.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_index_failure_does_not_fail_create() {
        let (service, repo, search) = service::<Device>();
        search.fail_writes(true);

        let created = service.create(Device::new()).await.unwrap();

        assert!(created.id.is_some());
        assert_eq!(repo.len().await, 1);
        assert!(search.indexed_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_reindex_restores_index_from_primary_store() {
        let (service, _repo, search) = service::<Device>();
        search.fail_writes(true);
        service.create(Device::new().with_uuid("a")).await.unwrap();
        service.create(Device::new().with_uuid("b")).await.unwrap();
        search.fail_writes(false);

        let count = service.reindex().await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(search.indexed_ids().await.len(), 2);
    }

    #[tokio::test]
    async fn test_reindex_drops_documents_of_deleted_rows() {
        let (service, repo, search) = service::<Device>();
        let kept = service.create(Device::new().with_uuid("kept")).await.unwrap();
        let gone = service.create(Device::new().with_uuid("gone")).await.unwrap();

        // the row disappears from the primary store behind the index's back
        repo.delete_by_id(gone.id.unwrap()).await.unwrap();

        let count = service.reindex().await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(search.indexed_ids().await, vec![kept.id.unwrap()]);
        assert_eq!(search.removed_ids().await, vec![gone.id.unwrap()]);
    }

    #[tokio::test]
    async fn test_failed_reindex_keeps_existing_documents() {
        let (service, _repo, search) = service::<Device>();
        let created = service.create(Device::new().with_uuid("a")).await.unwrap();
        search.fail_writes(true);

        assert!(service.reindex().await.is_err());

        assert_eq!(search.indexed_ids().await, vec![created.id.unwrap()]);
    }

    #[tokio::test]
    async fn test_rejected_delete_leaves_index_untouched() {
        let (service, repo, search) = service::<Device>();
        let created = service.create(Device::new().with_uuid("in-use")).await.unwrap();
        let id = created.id.unwrap();
        repo.mark_referenced(id).await;

        let err = service.delete(id).await.unwrap_err();

        assert!(matches!(err, DomainError::Port(PortError::Validation { .. })));
        assert_eq!(repo.len().await, 1);
        assert_eq!(search.indexed_ids().await, vec![id]);
        assert!(search.removed_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_find_one_missing() {
        let (service, _repo, _search) = service::<Device>();
        let err = service.find_one(DeviceId::new(i64::MAX)).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
