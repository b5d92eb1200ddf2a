//! Device Hub - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin device-hub
//!
//! API_PORT=9000 API_DATABASE_URL=postgres://... API_SEARCH_BACKEND=elasticsearch \
//!     cargo run --bin device-hub
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_APP_NAME` - Prefix of the alert headers (default: deviceHubApp)
//! * `API_SEARCH_BACKEND` - `memory` or `elasticsearch` (default: memory)
//! * `API_SEARCH_URL` - Elasticsearch base URL
//! * `API_SEARCH_INDEX_PREFIX` - Prefix for index names
//! * `API_SEARCH_MAX_RESULTS` - Most hits a cluster search returns (default: 1000)
//!
//! A malformed variable aborts startup.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::{Entity, EntityPort, HealthCheckable, SearchPort};
use domain_devices::{EntityService, Temperature};
use infra_db::{
    create_pool, run_migrations, DatabaseConfig, DatabaseHealth, DatabasePool,
    PgApplicationRepository, PgDeviceRepository, PgPushNotificationTokenRepository,
    PgSmsNotificationRepository, PgTemperatureRepository, PgValuesRepository,
};
use infra_search::{ElasticsearchConfig, ElasticsearchIndex, InMemorySearchIndex};
use interface_api::config::{ApiConfig, SearchBackend};
use interface_api::{create_router, AppState};
use validator::Validate;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading API_* configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        search = ?config.search_backend,
        "Starting Device Hub API Server"
    );

    tracing::info!("Connecting to database...");
    let pool = create_pool(DatabaseConfig::new(&config.database_url))
        .await
        .context("connecting to database")?;
    run_migrations(&pool).await.context("running migrations")?;
    tracing::info!("Database ready");

    let state = build_state(pool, &config)?;

    if config.search_backend == SearchBackend::Memory {
        let indexed = state.reindex_all().await.context("building search index")?;
        tracing::info!(indexed, "In-memory search index built");
    }

    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn build_state(pool: DatabasePool, config: &ApiConfig) -> anyhow::Result<AppState> {
    let mut readiness: Vec<Arc<dyn HealthCheckable>> = vec![Arc::new(DatabaseHealth::new(pool.clone()))];
    if config.search_backend == SearchBackend::Elasticsearch {
        readiness.push(Arc::new(ElasticsearchIndex::<Temperature>::new(search_config(config))?));
    }

    Ok(AppState {
        temperatures: service(PgTemperatureRepository::new(pool.clone()), config)?,
        devices: service(PgDeviceRepository::new(pool.clone()), config)?,
        applications: service(PgApplicationRepository::new(pool.clone()), config)?,
        push_notification_tokens: service(PgPushNotificationTokenRepository::new(pool.clone()), config)?,
        sms_notifications: service(PgSmsNotificationRepository::new(pool.clone()), config)?,
        values: service(PgValuesRepository::new(pool), config)?,
        readiness,
        config: config.clone(),
    })
}

/// Pairs a repository with the configured search backend
fn service<E, R>(repository: R, config: &ApiConfig) -> anyhow::Result<EntityService<E>>
where
    E: Entity + Validate,
    R: EntityPort<E>,
{
    let search: Arc<dyn SearchPort<E>> = match config.search_backend {
        SearchBackend::Memory => Arc::new(InMemorySearchIndex::<E>::new()),
        SearchBackend::Elasticsearch => Arc::new(ElasticsearchIndex::<E>::new(search_config(config))?),
    };
    Ok(EntityService::new(Arc::new(repository), search))
}

fn search_config(config: &ApiConfig) -> ElasticsearchConfig {
    ElasticsearchConfig::new(config.search_url.as_str())
        .index_prefix(config.search_index_prefix.as_str())
        .max_results(config.search_max_results)
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
