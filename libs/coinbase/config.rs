use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub rest: RestConfig,

    #[serde(default)]
    pub stream: StreamConfig,

    /// Owner whose credentials the vault serves
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            rest: RestConfig::default(),
            stream: StreamConfig::default(),
            owner: default_owner(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_advanced_url")]
    pub advanced_url: String,

    #[serde(default = "default_exchange_url")]
    pub exchange_url: String,

    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            advanced_url: default_advanced_url(),
            exchange_url: default_exchange_url(),
            oauth_url: default_oauth_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_ws_url")]
    pub url: String,

    /// Products subscribed on connect
    #[serde(default)]
    pub product_ids: Vec<String>,

    /// Channels subscribed on connect
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,

    /// Delay between consecutive subscribe dispatches
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,

    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            product_ids: Vec::new(),
            channels: default_channels(),
            pacing_delay_ms: default_pacing_delay_ms(),
            ping_interval_secs: default_ping_interval_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

fn default_owner() -> String {
    "primary".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_advanced_url() -> String {
    "https://api.coinbase.com".to_string()
}

fn default_exchange_url() -> String {
    "https://api.exchange.coinbase.com".to_string()
}

fn default_oauth_url() -> String {
    "https://api.coinbase.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_ws_url() -> String {
    "wss://advanced-trade-ws.coinbase.com".to_string()
}

fn default_channels() -> Vec<String> {
    vec!["heartbeats".to_string()]
}

fn default_pacing_delay_ms() -> u64 {
    250
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

impl GatewayConfig {
    /// Load configuration from YAML file and .env
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: GatewayConfig = serde_yaml::from_str(&yaml_content)?;

        // Load .env file
        dotenv::dotenv().ok(); // Don't fail if .env doesn't exist

        // Override endpoints from environment if present
        if let Ok(url) = std::env::var("COINBASE_ADVANCED_URL") {
            info!("Overriding advanced API URL from environment variable");
            config.rest.advanced_url = url;
        }
        if let Ok(url) = std::env::var("COINBASE_EXCHANGE_URL") {
            info!("Overriding exchange API URL from environment variable");
            config.rest.exchange_url = url;
        }
        if let Ok(url) = std::env::var("COINBASE_OAUTH_URL") {
            info!("Overriding OAuth API URL from environment variable");
            config.rest.oauth_url = url;
        }
        if let Ok(url) = std::env::var("COINBASE_WS_URL") {
            info!("Overriding websocket URL from environment variable");
            config.stream.url = url;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.rest.advanced_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "advanced_url cannot be empty".to_string(),
            ));
        }
        if self.rest.exchange_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "exchange_url cannot be empty".to_string(),
            ));
        }
        if self.rest.oauth_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "oauth_url cannot be empty".to_string(),
            ));
        }
        if self.stream.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "stream url cannot be empty".to_string(),
            ));
        }

        if self.rest.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.stream.ping_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "ping_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.stream.reconnect_delay_secs == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect_delay_secs must be greater than 0".to_string(),
            ));
        }

        if self.owner.is_empty() {
            return Err(ConfigError::ValidationError(
                "owner cannot be empty".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Advanced API URL: {}", self.rest.advanced_url);
        info!("  Exchange API URL: {}", self.rest.exchange_url);
        info!("  OAuth API URL: {}", self.rest.oauth_url);
        info!("  Websocket URL: {}", self.stream.url);
        info!("  Products: {}", self.stream.product_ids.join(", "));
        info!("  Channels: {}", self.stream.channels.join(", "));
        info!("  Subscribe pacing: {} ms", self.stream.pacing_delay_ms);
        info!("  Owner: {}", self.owner);
        info!("  Log level: {}", self.log_level);
    }
}
