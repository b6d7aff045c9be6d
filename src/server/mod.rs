//! AutoML Studio server module
//!
//! Serves the save/load demo form and routes its button presses to the
//! setup, train and predict workflows.

mod api;
mod error;
mod state;
mod handlers;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::SESSION_COOKIE;
pub use state::AppState;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DemoConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory trained models are saved to
    pub model_dir: PathBuf,
    /// Sessions unused for this long are dropped
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./mymodelfolder")),
            session_ttl: Duration::from_secs(
                std::env::var("SESSION_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
        }
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig, demo: DemoConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    std::fs::create_dir_all(&config.model_dir)?;

    if demo.split_seed.is_some() {
        warn!("SPLIT_SEED is set, every session gets the same partitions");
    }

    let state = Arc::new(AppState::new(config.clone(), demo));
    let app = create_router(Arc::clone(&state));

    let sweeper = {
        let state = Arc::clone(&state);
        let period = (config.session_ttl / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                state.evict_idle().await;
            }
        })
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        model_dir = %config.model_dir.display(),
        session_ttl_secs = config.session_ttl.as_secs(),
        started_at = %start_time.to_rfc3339(),
        "AutoML Studio server starting"
    );
    info!(url = %format!("http://{}/demo", addr), "Demo UI available");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c, shutting down");
            return;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    sweeper.abort();
    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        if std::env::var("API_PORT").is_err() {
            assert_eq!(config.port, 8080);
        }
        if std::env::var("MODEL_DIR").is_err() {
            assert_eq!(config.model_dir, PathBuf::from("./mymodelfolder"));
        }
        if std::env::var("SESSION_TTL_SECS").is_err() {
            assert_eq!(config.session_ttl, Duration::from_secs(1800));
        }
    }
}
