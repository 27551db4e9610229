//! Live market feed printer
//!
//! Connects to the Coinbase WebSocket feed, subscribes to the channels from
//! the config, and prints every channel frame to stdout verbatim.
//!
//! Reads optional environment variables from `.env`:
//!   - CONFIG_PATH (defaults to `config.yaml`)
//!   - COINBASE_API_KEY, COINBASE_API_SECRET (enables the user channel)
//!
//! Usage:
//!   cargo run --bin market_feed

use anyhow::Result;
use coinbase::config::GatewayConfig;
use coinbase::logging::init_tracing;
use coinbase::stream::{FeedAuth, FeedClient, FeedConfig, FeedEvent, SubscribeIntent};
use keyvault::{CredentialRecord, CredentialStore, KeyVault, MemoryCredentialStore};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load config first (before logging is initialized)
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = if Path::new(&config_path).exists() {
        GatewayConfig::load(&config_path)?
    } else {
        GatewayConfig::default()
    };

    init_tracing(&config.log_level);
    config.log();

    let store = Arc::new(MemoryCredentialStore::new());
    let credentials = match (
        std::env::var("COINBASE_API_KEY"),
        std::env::var("COINBASE_API_SECRET"),
    ) {
        (Ok(api_key), Ok(secret)) => {
            store
                .insert(CredentialRecord::new(
                    "env-key",
                    &config.owner,
                    api_key,
                    secret,
                ))
                .await?;
            true
        }
        _ => false,
    };
    let vault = Arc::new(KeyVault::new(store));

    let auth = credentials.then(|| FeedAuth {
        vault: Arc::clone(&vault),
        owner: config.owner.clone(),
    });

    print_banner(&config.stream.url, &config.stream.channels, credentials);

    let client = FeedClient::spawn(FeedConfig::from_config(&config.stream, auth));

    // Verbatim fan-out to stdout
    client.register_handler(Box::new(|frame: &Value| {
        println!("{}", frame);
        Ok(())
    }));

    if credentials {
        client.subscribe(
            SubscribeIntent::new(
                vec!["user".to_string()],
                config.stream.product_ids.clone(),
            )
            .authenticated(),
        )?;
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                while let Some(event) = client.try_recv_event() {
                    if let FeedEvent::SubscriptionRejected(reason) = event {
                        warn!("Subscription rejected: {}", reason);
                    }
                }
            }
        }
    }

    let metrics = client.metrics();
    info!(
        "Session totals: {} frames received, {} sent, {} reconnects",
        metrics.frames_received, metrics.frames_sent, metrics.reconnect_count
    );

    client.shutdown().await?;
    print_shutdown();
    Ok(())
}

fn print_banner(url: &str, channels: &[String], authenticated: bool) {
    info!("");
    info!("========================================");
    info!("Starting Coinbase market feed");
    info!("Feed URL: {}", url);
    info!("Channels: {}", channels.join(", "));
    if authenticated {
        info!("Credentials: loaded from environment");
    } else {
        info!("Credentials: none (public channels only)");
    }
    info!("Press Ctrl+C to stop");
    info!("========================================");
    info!("");
}

fn print_shutdown() {
    info!("");
    info!("========================================");
    info!("Market feed stopped gracefully");
    info!("========================================");
}
