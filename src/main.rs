use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use roadassist::db::memory::MemoryStore;
use roadassist::db::pool::{get_db_pool, run_migrations};
use roadassist::db::postgres::PgStore;
use roadassist::db::store::Store;
use roadassist::{build_app, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log directory {}", config.log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let (store, pg): (Arc<dyn Store>, Option<PgStore>) = match &config.database_url {
        Some(url) => {
            let pool = get_db_pool(url, config.db_max_connections)
                .await
                .context("failed to connect to the database")?;
            run_migrations(&pool).await.context("failed to run migrations")?;
            let pg = PgStore::new(pool);
            let store: Arc<dyn Store> = Arc::new(pg.clone());
            (store, Some(pg))
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store. Data is lost on exit.");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    let addr = config.bind_addr;
    let app = build_app(AppState::new(store, config));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server running at http://{}", listener.local_addr()?);
    info!("API docs at http://{addr}/swagger and http://{addr}/rapidoc");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pg))
        .await
        .context("server encountered an error")?;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal(pg: Option<PgStore>) {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => warn!("Failed to listen for Ctrl+C: {e}. Shutting down."),
    }
    if let Some(pg) = pg {
        info!("Closing database pool...");
        pg.pool().close().await;
        info!("Database pool closed.");
    }
}
