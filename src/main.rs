//! Ephemeral Relay - HTTP server
//!
//! Stores messages for five minutes and broadcasts each one as it arrives.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ephemeral_relay::api::{create_router_with_cors, AppState};
use ephemeral_relay::broadcast::{Broadcaster, LocalChannel, WebhookBroadcaster};
use ephemeral_relay::config::{self, ServerConfig};
use ephemeral_relay::spawn_expiry_task;

/// Main entry point for the relay server.
///
/// # Startup Sequence
/// 1. Load `config.env` if present
/// 2. Initialize tracing subscriber for logging
/// 3. Load configuration from environment variables
/// 4. Pick the broadcaster (hosted webhook or in-process channel)
/// 5. Create the message store and start the expiry sweep
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file_loaded = config::load_env_file();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ephemeral_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ephemeral Relay server");
    if env_file_loaded {
        info!("Loaded environment from {}", config::ENV_FILE);
    }

    let config = ServerConfig::from_env();
    info!(
        "Configuration loaded: port={}, message_ttl={}s, sweep_interval={}s, channel={}, event={}",
        config.server_port,
        config.message_ttl,
        config.sweep_interval,
        config.broadcast_channel,
        config.broadcast_event
    );

    let broadcaster: Arc<dyn Broadcaster> = match &config.broadcast_webhook_url {
        Some(url) => {
            info!("Broadcasting through webhook {}", url);
            Arc::new(
                WebhookBroadcaster::new(
                    url.clone(),
                    config.broadcast_channel.clone(),
                    config.publish_timeout(),
                )
                .context("Failed to build webhook broadcaster")?,
            )
        }
        None => {
            info!("Broadcasting on in-process channel {}", config.broadcast_channel);
            Arc::new(LocalChannel::new(config.broadcast_channel.clone()))
        }
    };

    let state = AppState::from_config(&config, broadcaster);
    info!("Message store initialized");

    let sweep_handle = spawn_expiry_task(state.store.clone(), config.sweep_interval());
    info!("Background expiry sweep started");

    let app = create_router_with_cors(state, config.cors_allowed_origin.as_deref())?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the expiry sweep and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweep_handle.abort();
    warn!("Expiry sweep aborted");
}
