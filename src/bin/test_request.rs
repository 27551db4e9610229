//! Test binary for checking REST connectivity
//!
//! Lists products from the public market data surface, and account balances
//! from the Advanced Trade surface when credentials are available.
//!
//! Reads optional environment variables from `.env`:
//!   - CONFIG_PATH (defaults to `config.yaml`)
//!   - COINBASE_API_KEY, COINBASE_API_SECRET (enables the accounts check)
//!
//! Usage:
//!   cargo run --bin test_request

use anyhow::Result;
use coinbase::config::GatewayConfig;
use coinbase::logging::init_tracing;
use coinbase::rest::RestClient;
use keyvault::{CredentialRecord, CredentialStore, KeyVault, MemoryCredentialStore};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = if Path::new(&config_path).exists() {
        GatewayConfig::load(&config_path)?
    } else {
        GatewayConfig::default()
    };

    init_tracing(&config.log_level);

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("COINBASE REST CHECK");
    println!("════════════════════════════════════════════════════════════════");
    println!();

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
    let client = RestClient::new(&config.rest, vault, &config.owner);

    println!("Fetching products...");
    let products = client.list_products().await?;

    println!();
    println!("PRODUCTS ({} listed):", products.len());
    println!("────────────────────────────────────────────────────────────────");
    for product in products.iter().take(5) {
        println!(
            "  {:<14} price {:>14.2}  24h volume {:>16.2}",
            product.product_id, product.price, product.volume_24h
        );
    }
    println!();

    if credentials {
        println!("Fetching accounts...");
        let accounts = client.list_accounts().await?;

        println!();
        println!("ACCOUNTS ({} listed):", accounts.len());
        println!("────────────────────────────────────────────────────────────────");
        for account in &accounts {
            println!(
                "  {:<8} balance {:>14.4}  available {:>14.4}  hold {:>10.4}",
                account.currency, account.balance, account.available, account.hold
            );
        }
    } else {
        println!("Skipping accounts check (no COINBASE_API_KEY in environment)");
    }

    println!();
    println!("════════════════════════════════════════════════════════════════");

    Ok(())
}
