//! Elasticsearch adapter
//!
//! Mirrors entities into an Elasticsearch-compatible cluster over its REST
//! API. Each entity type lives in its own index named after
//! [`Entity::INDEX_NAME`], optionally prefixed.
//!
//! | Operation | Request |
//! |---|---|
//! | index | `PUT /{index}/_doc/{id}` |
//! | remove | `DELETE /{index}/_doc/{id}` |
//! | search | `POST /{index}/_search` with a `query_string` query |
//! | clear | `POST /{index}/_delete_by_query` with `match_all` |
//! | retain | `POST /{index}/_delete_by_query` excluding the kept `ids` |
//!
//! # Error Handling
//!
//! - transport failures -> `PortError::Connection`
//! - 400 on search -> `PortError::InvalidQuery`
//! - 5xx -> `PortError::ServiceUnavailable`
//! - 404 on remove, search or clear -> treated as an empty index

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use core_kernel::{
    AdapterHealth, DomainPort, Entity, HealthCheckResult, HealthCheckable, PortError, SearchPort,
};

use crate::error::SearchError;

/// Connection settings for the search cluster
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Base URL of the cluster (e.g., "http://localhost:9200")
    pub base_url: String,
    /// Prefix prepended to every index name
    pub index_prefix: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of hits returned by a search
    pub max_results: usize,
    /// Make writes visible to search before returning
    pub refresh: bool,
}

impl ElasticsearchConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index_prefix: String::new(),
            timeout: Duration::from_secs(10),
            max_results: 1000,
            refresh: true,
        }
    }

    pub fn index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.index_prefix = prefix.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    hits: Hits<T>,
}

#[derive(Debug, Deserialize)]
struct Hits<T> {
    #[serde(default)]
    total: Option<Total>,
    hits: Vec<Hit<T>>,
}

#[derive(Debug, Deserialize)]
struct Total {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct Hit<T> {
    #[serde(rename = "_source")]
    source: T,
}

/// Search port backed by an Elasticsearch index
#[derive(Debug)]
pub struct ElasticsearchIndex<E: Entity> {
    client: Client,
    config: ElasticsearchConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for ElasticsearchIndex<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> ElasticsearchIndex<E> {
    /// Creates an adapter with its own connection pool
    pub fn new(config: ElasticsearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::Configuration(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Creates an adapter sharing an existing connection pool
    pub fn with_client(client: Client, config: ElasticsearchConfig) -> Self {
        Self {
            client,
            config,
            _entity: PhantomData,
        }
    }

    /// Fully qualified index name
    pub fn index_name(&self) -> String {
        format!("{}{}", self.config.index_prefix, E::INDEX_NAME)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.config.base_url, self.index_name(), path)
    }

    fn refresh_param(&self) -> &'static str {
        if self.config.refresh {
            "true"
        } else {
            "false"
        }
    }

    /// Builds the request body for a query string
    pub fn search_body(&self, query: &str) -> Value {
        let query = query.trim();
        let clause = if query.is_empty() {
            json!({ "match_all": {} })
        } else {
            json!({ "query_string": { "query": query } })
        };
        json!({ "query": clause, "size": self.config.max_results })
    }

    /// Builds the delete-by-query body dropping every document not in `keep`
    pub fn retain_body(keep: &BTreeSet<E::Id>) -> Value {
        let ids: Vec<String> = keep.iter().map(ToString::to_string).collect();
        json!({ "query": { "bool": { "must_not": { "ids": { "values": ids } } } } })
    }

    async fn delete_by_query(&self, body: &Value) -> Result<(), PortError> {
        let response = self
            .client
            .post(self.url("_delete_by_query"))
            .query(&[("refresh", self.refresh_param())])
            .json(body)
            .send()
            .await
            .map_err(SearchError::from)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn check(response: Response) -> Result<Response, SearchError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SearchError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl<E: Entity> DomainPort for ElasticsearchIndex<E> {}

#[async_trait]
impl<E: Entity> SearchPort<E> for ElasticsearchIndex<E> {
    #[instrument(skip_all, fields(index = E::INDEX_NAME))]
    async fn index(&self, entity: &E) -> Result<(), PortError> {
        let id = entity.id().ok_or_else(|| {
            PortError::validation(format!("cannot index a {} without an id", E::ENTITY_NAME))
        })?;
        let document = serde_json::to_value(entity).map_err(SearchError::from)?;

        let response = self
            .client
            .put(self.url(&format!("_doc/{}", id)))
            .query(&[("refresh", self.refresh_param())])
            .json(&document)
            .send()
            .await
            .map_err(SearchError::from)?;
        Self::check(response).await?;

        debug!(%id, "Indexed document");
        Ok(())
    }

    #[instrument(skip(self), fields(index = E::INDEX_NAME))]
    async fn remove(&self, id: E::Id) -> Result<(), PortError> {
        let response = self
            .client
            .delete(self.url(&format!("_doc/{}", id)))
            .query(&[("refresh", self.refresh_param())])
            .send()
            .await
            .map_err(SearchError::from)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(index = E::INDEX_NAME))]
    async fn search(&self, query: &str) -> Result<Vec<E>, PortError> {
        let response = self
            .client
            .post(self.url("_search"))
            .json(&self.search_body(query))
            .send()
            .await
            .map_err(SearchError::from)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = Self::check(response).await?;

        let body: Value = response.json().await.map_err(SearchError::from)?;
        let parsed: SearchResponse<E> = serde_json::from_value(body).map_err(SearchError::from)?;
        let returned = parsed.hits.hits.len();
        if let Some(total) = parsed.hits.total.as_ref().filter(|t| t.value > returned as u64) {
            warn!(
                total = total.value,
                returned,
                max_results = self.config.max_results,
                "Search matched more documents than the result cap"
            );
        }
        debug!(hits = returned, "Search completed");
        Ok(parsed.hits.hits.into_iter().map(|hit| hit.source).collect())
    }

    #[instrument(skip(self), fields(index = E::INDEX_NAME))]
    async fn clear(&self) -> Result<(), PortError> {
        self.delete_by_query(&json!({ "query": { "match_all": {} } })).await
    }

    #[instrument(skip_all, fields(index = E::INDEX_NAME, keep = keep.len()))]
    async fn retain(&self, keep: &BTreeSet<E::Id>) -> Result<(), PortError> {
        self.delete_by_query(&Self::retain_body(keep)).await
    }
}

#[async_trait]
impl<E: Entity> HealthCheckable for ElasticsearchIndex<E> {
    async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let result = self
            .client
            .get(format!("{}/_cluster/health", self.config.base_url))
            .send()
            .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(response) if response.status().is_success() => {
                let cluster: Value = response.json().await.unwrap_or(Value::Null);
                match cluster["status"].as_str() {
                    Some("green") => (AdapterHealth::Healthy, None),
                    Some("yellow") => (AdapterHealth::Degraded, Some("cluster status yellow".to_string())),
                    Some(other) => (AdapterHealth::Unhealthy, Some(format!("cluster status {}", other))),
                    None => (AdapterHealth::Unknown, None),
                }
            }
            Ok(response) => (
                AdapterHealth::Unhealthy,
                Some(format!("health endpoint returned {}", response.status())),
            ),
            Err(e) => (AdapterHealth::Unhealthy, Some(e.to_string())),
        };

        HealthCheckResult {
            adapter_id: format!("elasticsearch-{}", self.index_name()),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}
