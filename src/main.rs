use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use watchrank_api::{
    config::{Config, StorageBackend},
    db::{self, Cache, CacheWriterHandle, InMemoryRankStore, PgRankStore, RankStore},
    routes::{create_router, AppState},
    services::providers::{MetadataProvider, TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watchrank_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        storage_backend = ?config.storage_backend,
        "Loaded configuration"
    );

    let store = create_store(&config).await?;
    tracing::info!(store = store.name(), "Rank store ready");

    let (metadata_provider, cache_handle) = create_metadata_provider(&config)?;

    let state = AppState::new(store, metadata_provider);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    tracing::info!(%address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }
    tracing::info!("Graceful shutdown complete");

    Ok(())
}

async fn create_store(config: &Config) -> anyhow::Result<Arc<dyn RankStore>> {
    match config.storage_backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryRankStore::new())),
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database_url)
                .await
                .context("Failed to connect to database")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
            Ok(Arc::new(PgRankStore::new(pool)))
        }
    }
}

/// TMDB-backed metadata provider, only when an API key is configured
fn create_metadata_provider(
    config: &Config,
) -> anyhow::Result<(Option<Arc<dyn MetadataProvider>>, Option<CacheWriterHandle>)> {
    let Some(api_key) = config.tmdb_api_key.clone() else {
        tracing::warn!("TMDB_API_KEY not set, metadata backfill disabled");
        return Ok((None, None));
    };

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, handle) = Cache::new(redis_client);
    let provider: Arc<dyn MetadataProvider> = Arc::new(TmdbProvider::new(
        cache,
        api_key,
        config.tmdb_api_url.clone(),
    ));
    tracing::info!(provider = provider.name(), "Metadata backfill enabled");

    Ok((Some(provider), Some(handle)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
