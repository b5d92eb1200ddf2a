//! In-process search index
//!
//! Keeps a copy of every indexed entity and evaluates parsed query strings
//! against each entity's search document. Suited to local development and
//! tests; contents are lost on restart and rebuilt by a reindex.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use tracing::debug;

use core_kernel::{
    AdapterHealth, DomainPort, Entity, HealthCheckResult, HealthCheckable, PortError, SearchPort,
};

use crate::query::Query;

#[derive(Debug)]
pub struct InMemorySearchIndex<E: Entity> {
    documents: RwLock<BTreeMap<E::Id, E>>,
}

impl<E: Entity> Default for InMemorySearchIndex<E> {
    fn default() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<E: Entity> InMemorySearchIndex<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl<E: Entity> DomainPort for InMemorySearchIndex<E> {}

#[async_trait]
impl<E: Entity> SearchPort<E> for InMemorySearchIndex<E> {
    async fn index(&self, entity: &E) -> Result<(), PortError> {
        let id = entity.id().ok_or_else(|| {
            PortError::validation(format!("cannot index a {} without an id", E::ENTITY_NAME))
        })?;
        self.documents.write().await.insert(id, entity.clone());
        Ok(())
    }

    async fn remove(&self, id: E::Id) -> Result<(), PortError> {
        self.documents.write().await.remove(&id);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<E>, PortError> {
        let parsed = Query::parse(query)?;
        debug!(index = E::INDEX_NAME, ?parsed, "Evaluating query");
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .filter(|entity| parsed.matches(&entity.search_document()))
            .cloned()
            .collect())
    }

    async fn clear(&self) -> Result<(), PortError> {
        self.documents.write().await.clear();
        Ok(())
    }

    async fn retain(&self, keep: &BTreeSet<E::Id>) -> Result<(), PortError> {
        self.documents.write().await.retain(|id, _| keep.contains(id));
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> HealthCheckable for InMemorySearchIndex<E> {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: format!("memory-search-{}", E::INDEX_NAME),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some(format!("{} documents", self.len().await)),
            checked_at: Utc::now(),
        }
    }
}
