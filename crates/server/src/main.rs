use anyhow::Error as AnyhowError;
use chrono::Duration;
use db::{DbErr, DbService};
use server::{AppState, http};
use thiserror::Error;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils_jwt::JwtService;

const GRACEFUL_SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
const DEFAULT_DATABASE_URL: &str = "sqlite://taskboard.db?mode=rwc";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEV_JWT_SECRET: &str = "taskboard-dev-secret";

#[derive(Debug, Error)]
pub enum TaskboardError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), TaskboardError> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},db={level},utils_jwt={level},tower_http={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).expect("Failed to create tracing filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let jwt_secret = std::env::var("TASKBOARD_JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!(
            "TASKBOARD_JWT_SECRET is not set, using the built-in development secret; \
             tokens will not survive across deployments"
        );
        DEV_JWT_SECRET.to_string()
    });
    let token_ttl_hours = std::env::var("TASKBOARD_TOKEN_TTL_HOURS")
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|hours| *hours > 0)
        .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);

    let db = DbService::connect(&database_url).await?;
    tracing::info!("Connected to {database_url}");

    let state = AppState::new(
        db.conn,
        JwtService::new(jwt_secret.as_bytes()),
        Duration::hours(token_ttl_hours),
    );
    let app_router = http::router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    let actual_port = listener.local_addr()?.port();

    tracing::info!("Server running on http://{host}:{actual_port}");

    let (shutdown_rx, force_exit_rx) = spawn_shutdown_watchers();

    let serve_result = tokio::select! {
        res = axum::serve(listener, app_router)
            .with_graceful_shutdown(wait_for_watch_true(shutdown_rx.clone())) => res,
        _ = wait_for_watch_true(force_exit_rx) => {
            tracing::warn!("Force shutdown requested (second signal), exiting immediately");
            std::process::exit(130);
        }
        _ = shutdown_deadline(shutdown_rx.clone(), GRACEFUL_SHUTDOWN_TIMEOUT) => {
            tracing::warn!(
                "Graceful shutdown timed out after {:?}, exiting immediately",
                GRACEFUL_SHUTDOWN_TIMEOUT
            );
            std::process::exit(130);
        }
    };

    serve_result?;
    Ok(())
}

fn spawn_shutdown_watchers() -> (watch::Receiver<bool>, watch::Receiver<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (force_exit_tx, force_exit_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut shutdown_sent = false;

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigint = match signal(SignalKind::interrupt()) {
                Ok(sig) => sig,
                Err(e) => {
                    tracing::error!("Failed to install SIGINT handler: {e}");
                    return;
                }
            };
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sig) => Some(sig),
                Err(e) => {
                    tracing::error!("Failed to install SIGTERM handler: {e}");
                    None
                }
            };

            loop {
                tokio::select! {
                    _ = sigint.recv() => {},
                    _ = async {
                        if let Some(sigterm) = sigterm.as_mut() {
                            sigterm.recv().await;
                        } else {
                            std::future::pending::<()>().await;
                        }
                    } => {},
                }

                if !shutdown_sent {
                    shutdown_sent = true;
                    tracing::info!("Shutdown signal received, draining connections");
                    let _ = shutdown_tx.send(true);
                } else {
                    let _ = force_exit_tx.send(true);
                    return;
                }
            }
        }

        #[cfg(not(unix))]
        {
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    tracing::error!("Failed to listen for ctrl-c");
                    return;
                }
                if !shutdown_sent {
                    shutdown_sent = true;
                    tracing::info!("Shutdown signal received, draining connections");
                    let _ = shutdown_tx.send(true);
                } else {
                    let _ = force_exit_tx.send(true);
                    return;
                }
            }
        }
    });

    (shutdown_rx, force_exit_rx)
}

async fn wait_for_watch_true(mut rx: watch::Receiver<bool>) {
    if *rx.borrow() {
        return;
    }
    while rx.changed().await.is_ok() {
        if *rx.borrow() {
            return;
        }
    }
    // Sender dropped without signalling; park forever so select! ignores us.
    std::future::pending::<()>().await;
}

async fn shutdown_deadline(rx: watch::Receiver<bool>, timeout: std::time::Duration) {
    wait_for_watch_true(rx).await;
    tokio::time::sleep(timeout).await;
}
