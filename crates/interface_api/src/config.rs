//! API configuration

use serde::Deserialize;

/// Where the search mirror lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// In-process index, rebuilt from the database on startup
    Memory,
    /// Elasticsearch-compatible cluster at `search_url`
    Elasticsearch,
}

/// API configuration
///
/// Loaded from `API_*` environment variables, e.g. `API_PORT=9000` or
/// `API_SEARCH_BACKEND=elasticsearch`. Unset keys keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Application name used in `X-{app}-alert` headers
    pub app_name: String,
    pub search_backend: SearchBackend,
    /// Base URL of the search cluster
    pub search_url: String,
    /// Prefix for search index names
    pub search_index_prefix: String,
    /// Most hits a cluster search returns
    pub search_max_results: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/devicehub".to_string(),
            log_level: "info".to_string(),
            app_name: "deviceHubApp".to_string(),
            search_backend: SearchBackend::Memory,
            search_url: "http://localhost:9200".to_string(),
            search_index_prefix: String::new(),
            search_max_results: 1000,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.app_name, "deviceHubApp");
        assert_eq!(config.search_backend, SearchBackend::Memory);
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: ApiConfig = config::Config::builder()
            .set_override("port", 9000)
            .unwrap()
            .set_override("search_backend", "elasticsearch")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.search_backend, SearchBackend::Elasticsearch);
        assert_eq!(config.jwt_expiration_secs, 3600);
        assert_eq!(config.search_max_results, 1000);
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let result: Result<ApiConfig, _> = config::Config::builder()
            .set_override("port", "80a")
            .unwrap()
            .set_override("jwt_secret", "from-env")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize();

        assert!(result.is_err());
    }
}
