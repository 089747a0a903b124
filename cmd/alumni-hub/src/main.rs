//! # Alumni Hub
//!
//! Wires settings, logging, the selected adapters and the services into one
//! axum server.

use std::sync::Arc;

use api_adapters::{app, AppState, HttpOptions};
use auth_adapters::JwtAuthority;
use configs::{DatabaseSettings, LogFormat, LogSettings, Settings, StorageBackend};
use domains::Repos;
use services::Services;
use storage_adapters::{LocalMediaStorage, MemoryStore};
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Room for multipart framing around the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.log);

    let repos = open_repos(&settings.database).await?;
    tokio::fs::create_dir_all(&settings.media.root).await?;
    let media = Arc::new(LocalMediaStorage::new(
        &settings.media.root,
        settings.media.max_upload_bytes,
    ));
    let verifier = Arc::new(JwtAuthority::new(&settings.auth.jwt_secret)?);

    let state = AppState::new(Services::new(repos, media), verifier);
    let router = app(
        state,
        HttpOptions {
            uploads_dir: settings.media.root.clone(),
            max_body_bytes: settings.media.max_upload_bytes + MULTIPART_OVERHEAD,
        },
    );

    let addr = settings.server.addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, backend = ?settings.database.backend, "alumni hub listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("shut down cleanly");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    tracing_subscriber::registry()
        .with(filter)
        .with((log.format == LogFormat::Json).then(|| fmt::layer().json()))
        .with((log.format == LogFormat::Pretty).then(fmt::layer))
        .init();
}

async fn open_repos(database: &DatabaseSettings) -> anyhow::Result<Repos> {
    match database.backend {
        StorageBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Ok(Repos::from_store(Arc::new(MemoryStore::new())))
        }
        #[cfg(feature = "db-sqlite")]
        StorageBackend::Sqlite => {
            let store = storage_adapters::SqliteStore::connect(&database.url).await?;
            Ok(Repos::from_store(Arc::new(store)))
        }
        #[cfg(not(feature = "db-sqlite"))]
        StorageBackend::Sqlite => anyhow::bail!("built without the db-sqlite feature"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
