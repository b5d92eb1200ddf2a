//! In-memory port implementations for testing
//!
//! These adapters store entities in memory and are useful for exercising
//! the service layer and the HTTP surface without a database or a search
//! cluster.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use core_kernel::{DomainPort, Entity, EntityPort, PortError, SearchPort};

/// In-memory primary store with a sequence-assigned key
#[derive(Debug)]
pub struct InMemoryEntityPort<E: Entity> {
    entities: RwLock<BTreeMap<E::Id, E>>,
    sequence: AtomicI64,
    referenced: RwLock<BTreeSet<E::Id>>,
}

impl<E: Entity> Default for InMemoryEntityPort<E> {
    fn default() -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
            sequence: AtomicI64::new(1),
            referenced: RwLock::new(BTreeSet::new()),
        }
    }
}

impl<E: Entity> InMemoryEntityPort<E> {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store, assigning ids where missing
    pub async fn with_entities(entities: Vec<E>) -> Self {
        let port = Self::new();
        for entity in entities {
            let _ = port.save(entity).await;
        }
        port
    }

    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }

    /// Marks a row as referenced by another table, so deleting it fails
    /// the way a foreign key violation does
    pub async fn mark_referenced(&self, id: E::Id) {
        self.referenced.write().await.insert(id);
    }
}

impl<E: Entity> DomainPort for InMemoryEntityPort<E> {}

#[async_trait]
impl<E: Entity> EntityPort<E> for InMemoryEntityPort<E> {
    async fn save(&self, mut entity: E) -> Result<E, PortError> {
        let id = match entity.id() {
            Some(id) => {
                // keep the sequence ahead of explicitly keyed rows
                let raw: i64 = id.into();
                self.sequence.fetch_max(raw + 1, Ordering::SeqCst);
                id
            }
            None => {
                let id = E::Id::from(self.sequence.fetch_add(1, Ordering::SeqCst));
                entity.set_id(id);
                id
            }
        };
        self.entities.write().await.insert(id, entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, PortError> {
        Ok(self.entities.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<E>, PortError> {
        Ok(self.entities.read().await.values().cloned().collect())
    }

    async fn delete_by_id(&self, id: E::Id) -> Result<bool, PortError> {
        if self.referenced.read().await.contains(&id) {
            return Err(PortError::validation_field(
                format!("{} {} is still referenced", E::ENTITY_NAME, id),
                "reference",
            ));
        }
        Ok(self.entities.write().await.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64, PortError> {
        Ok(self.len().await as u64)
    }
}

/// Search port that records every call it receives
///
/// Searching returns indexed documents with any field value containing the
/// query text (case-insensitive); `*` or an empty query returns everything.
/// Writes can be made to fail to simulate an unreachable index.
#[derive(Debug)]
pub struct RecordingSearchPort<E: Entity> {
    documents: RwLock<BTreeMap<E::Id, E>>,
    removed: RwLock<Vec<E::Id>>,
    index_calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl<E: Entity> Default for RecordingSearchPort<E> {
    fn default() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            removed: RwLock::new(Vec::new()),
            index_calls: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl<E: Entity> RecordingSearchPort<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Ids currently present in the index
    pub async fn indexed_ids(&self) -> Vec<E::Id> {
        self.documents.read().await.keys().copied().collect()
    }

    /// Ids passed to `remove`, in call order
    pub async fn removed_ids(&self) -> Vec<E::Id> {
        self.removed.read().await.clone()
    }

    /// Number of successful `index` calls
    pub async fn index_calls(&self) -> usize {
        self.index_calls.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), PortError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(PortError::ServiceUnavailable {
                service: "recording-search".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl<E: Entity> DomainPort for RecordingSearchPort<E> {}

#[async_trait]
impl<E: Entity> SearchPort<E> for RecordingSearchPort<E> {
    async fn index(&self, entity: &E) -> Result<(), PortError> {
        self.check_writable()?;
        let id = entity
            .id()
            .ok_or_else(|| PortError::validation("cannot index an entity without an id"))?;
        self.documents.write().await.insert(id, entity.clone());
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, id: E::Id) -> Result<(), PortError> {
        self.check_writable()?;
        self.documents.write().await.remove(&id);
        self.removed.write().await.push(id);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<E>, PortError> {
        let needle = query.trim().to_lowercase();
        let documents = self.documents.read().await;
        if needle.is_empty() || needle == "*" {
            return Ok(documents.values().cloned().collect());
        }
        Ok(documents
            .values()
            .filter(|e| {
                e.search_document()
                    .iter()
                    .any(|f| f.value.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn clear(&self) -> Result<(), PortError> {
        self.check_writable()?;
        self.documents.write().await.clear();
        Ok(())
    }

    async fn retain(&self, keep: &BTreeSet<E::Id>) -> Result<(), PortError> {
        self.check_writable()?;
        let mut documents = self.documents.write().await;
        let stale: Vec<E::Id> = documents.keys().filter(|id| !keep.contains(id)).copied().collect();
        for id in &stale {
            documents.remove(id);
        }
        self.removed.write().await.extend(stale);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Device;
    use core_kernel::DeviceId;

    #[tokio::test]
    async fn test_sequence_assigns_increasing_ids() {
        let port = InMemoryEntityPort::<Device>::new();
        let a = port.save(Device::new()).await.unwrap();
        let b = port.save(Device::new()).await.unwrap();
        assert!(a.id.unwrap() < b.id.unwrap());
    }

    #[tokio::test]
    async fn test_explicit_id_advances_sequence() {
        let port = InMemoryEntityPort::<Device>::new();
        port.save(Device::new().with_id(DeviceId::new(50))).await.unwrap();
        let next = port.save(Device::new()).await.unwrap();
        assert_eq!(next.id, Some(DeviceId::new(51)));
    }

    #[tokio::test]
    async fn test_find_all_is_ordered_by_id() {
        let port = InMemoryEntityPort::with_entities(vec![
            Device::new().with_id(DeviceId::new(3)),
            Device::new().with_id(DeviceId::new(1)),
        ])
        .await;
        let ids: Vec<_> = port.find_all().await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![Some(DeviceId::new(1)), Some(DeviceId::new(3))]);
    }

    #[tokio::test]
    async fn test_recording_search_matches_substrings() {
        let search = RecordingSearchPort::<Device>::new();
        search
            .index(&Device::new().with_id(DeviceId::new(1)).with_uuid("Alpha"))
            .await
            .unwrap();
        search
            .index(&Device::new().with_id(DeviceId::new(2)).with_uuid("beta"))
            .await
            .unwrap();

        assert_eq!(search.search("alp").await.unwrap().len(), 1);
        assert_eq!(search.search("*").await.unwrap().len(), 2);
    }
}
