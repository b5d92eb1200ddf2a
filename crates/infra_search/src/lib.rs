//! Search Index Infrastructure
//!
//! This crate provides the secondary search index that mirrors the primary
//! store. Searches take a query string in the Lucene query-string syntax
//! understood by Elasticsearch.
//!
//! # Adapters
//!
//! - [`InMemorySearchIndex`]: evaluates queries in process, used for local
//!   development and tests
//! - [`ElasticsearchIndex`]: forwards documents and queries to an
//!   Elasticsearch-compatible REST API
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_search::{ElasticsearchConfig, ElasticsearchIndex};
//!
//! let index = ElasticsearchIndex::<Device>::new(ElasticsearchConfig::new("http://localhost:9200"))?;
//! let hits = index.search("uuid:AAAA* AND NOT idUpdated:true").await?;
//! ```

pub mod query;
pub mod memory;
pub mod elasticsearch;
pub mod error;

pub use query::{Query, Clause, Occur};
pub use memory::InMemorySearchIndex;
pub use elasticsearch::{ElasticsearchConfig, ElasticsearchIndex};
pub use error::SearchError;
