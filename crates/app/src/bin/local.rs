// Mailroom Admin API - Local Development Server

use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

use mailroom_common::{Config, StoreBackend};
use mailroom_directory::{DirectoryStores, InMemoryDirectory};

/// Lifetime of the development admin token
const DEV_TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mailroom=debug,tower_http=debug")),
        )
        .pretty()
        .init();

    info!("Starting Mailroom Admin API local development server");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(backend = ?config.store_backend, "Configuration loaded successfully");

    let stores = match config.store_backend {
        StoreBackend::Memory => {
            let store = InMemoryDirectory::new();
            let token = mailroom_app::seed_dev_admin(&store, &config, DEV_TOKEN_TTL_SECONDS)?;
            warn!("In-memory directory seeded with a development admin; do not use in production");
            info!("Development admin token: {}", token);
            DirectoryStores::in_memory(store)
        }
        StoreBackend::Postgres => mailroom_app::open_stores(&config).await.map_err(|e| {
            error!("Failed to open directory store: {}", e);
            e
        })?,
    };

    info!("Directory store ready");

    let app = mailroom_app::create_app(&config, stores).map_err(|e| {
        error!("Failed to create application: {}", e);
        e
    })?;

    let app = mailroom_app::with_middleware(app, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Server starting on http://{}", addr);
    info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
