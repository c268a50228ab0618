//! Ephemeral Relay - command line client
//!
//! Sends messages and looks them up, keeping a local cache of what it has seen.
//!
//! This binary only learns about messages through fallback fetches. Broadcast
//! receipt needs a subscription to the server's channel, and `LocalChannel`
//! only reaches subscribers in the server's own process; an embedding
//! application wires that up with `CacheHandle::attach`. `listen` keeps the
//! periodic sweep running over the cache file until interrupted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ephemeral_relay::client::{
    CacheHandle, ClientCache, FileStorage, LookupResolver, LookupSource, RelayClient,
};
use ephemeral_relay::clock::SystemClock;
use ephemeral_relay::config::{self, ClientConfig};
use ephemeral_relay::RelayError;

#[derive(Parser, Debug)]
#[command(name = "relay-client", version, about = "Send and look up short-lived messages")]
struct Cli {
    /// Relay API base URL, including the /api prefix
    #[arg(long, env = "RELAY_API_URL")]
    api_url: Option<String>,

    /// Local cache file
    #[arg(long, env = "RELAY_CACHE_PATH")]
    cache_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a message under an id
    Send {
        #[arg(long)]
        id: String,
        #[arg(long)]
        message: String,
    },
    /// Look up the message stored under an id
    Search {
        #[arg(long)]
        id: String,
    },
    /// Drop expired messages from the local cache
    Sweep,
    /// List unexpired messages in the local cache
    List,
    /// Keep sweeping the local cache until interrupted
    Listen,
}

#[tokio::main]
async fn main() -> ExitCode {
    config::load_env_file();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ephemeral_relay=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(notice) => {
            println!("{}", notice);
            ExitCode::SUCCESS
        }
        Err(notice) => {
            eprintln!("{}", notice);
            ExitCode::FAILURE
        }
    }
}

/// Runs one command and returns the notice to show the user.
async fn run(cli: Cli) -> Result<String, String> {
    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(cache_path) = cli.cache_path {
        config.cache_path = cache_path;
    }

    let cache = ClientCache::open(
        Arc::new(FileStorage::new(&config.cache_path)),
        Arc::new(SystemClock),
        config.message_ttl(),
    )
    .map_err(|err| format!("Failed to open cache {}: {}", config.cache_path.display(), err))?;
    let cache = Arc::new(cache);

    let client = RelayClient::new(&config.api_url, config.fetch_timeout())
        .map_err(|err| format!("Failed to create HTTP client: {}", err))?;

    match cli.command {
        Command::Send { id, message } => match client.send_message(&id, &message).await {
            Ok(response) if response.is_partial() => Ok(format!(
                "Message stored with ID: {} ({})",
                id,
                response.warning.unwrap_or_default()
            )),
            Ok(_) => Ok(format!("Message sent with ID: {}", id)),
            Err(RelayError::Validation(msg)) => Err(msg),
            Err(err) => {
                tracing::error!("Send failed: {}", err);
                Err("Failed to send message. Please try again.".to_string())
            }
        },
        Command::Search { id } => {
            let resolver = LookupResolver::new(cache, client);
            match resolver.resolve(&id).await {
                Ok(Some(resolved)) => {
                    let origin = match resolved.source {
                        LookupSource::Cache => "local cache",
                        LookupSource::Server => "the server",
                    };
                    Ok(format!(
                        "{}\n(Message retrieved from {} successfully!)",
                        resolved.message, origin
                    ))
                }
                Ok(None) => Err("Message not found on the server.".to_string()),
                Err(RelayError::Validation(msg)) => Err(msg),
                Err(err) => {
                    tracing::error!("Error fetching message: {}", err);
                    Err("Failed to retrieve message. Please try again.".to_string())
                }
            }
        }
        Command::Sweep => cache
            .sweep()
            .map(|removed| format!("Removed {} expired messages", removed))
            .map_err(|err| format!("Sweep failed: {}", err)),
        Command::Listen => {
            let interval = config.sweep_interval();
            let mut handle = CacheHandle::sweeping(cache, interval);
            eprintln!(
                "Sweeping {} every {:?}, Ctrl+C to stop",
                config.cache_path.display(),
                interval
            );

            let stopped = tokio::signal::ctrl_c().await;
            handle.teardown();
            stopped
                .map(|()| "Stopped".to_string())
                .map_err(|err| format!("Failed to listen for Ctrl+C: {}", err))
        }
        Command::List => {
            let entries = cache
                .entries()
                .map_err(|err| format!("Failed to read cache: {}", err))?;
            if entries.is_empty() {
                return Ok("No cached messages".to_string());
            }
            Ok(entries
                .iter()
                .map(|entry| format!("{}\t{}", entry.id, entry.message))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}
