//! To-do Hub server - binary entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use todo_hub::{create_router, AppConfig, AppResult, AppState, AuthService, HubSet, Store};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting {} v{}", todo_hub::NAME, todo_hub::VERSION);

    if config.jwt_secret_generated {
        tracing::warn!("JWT_SECRET not set; tokens will not survive a restart");
    }

    let store = Arc::new(Store::open(&config.db_path)?);
    tracing::info!(path = %store.file_path().display(), "store opened");

    let auth = Arc::new(AuthService::new(&config));
    let (hubs, runtime) = HubSet::start(&config.hub);

    let state = Arc::new(AppState::new(store, auth, hubs));
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    let mut shutdown_rx = shutdown_signal();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let signalled = shutdown_rx.wait_for(|stop| *stop).await.is_ok();
            if !signalled {
                // No signal handler; run until the process is killed.
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
            // Close hub connections first; graceful shutdown waits on them.
            runtime.shutdown().await;
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Ctrl+C flips the returned flag to `true`
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = tx.send(true);
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }
    rx
}
