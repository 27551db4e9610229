//! Integration test: configuration loading
//!
//! Round-trips a YAML file through GatewayConfig::load and exercises the
//! validation failures.

use coinbase::config::{ConfigError, GatewayConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_full_config_round_trip() {
    let file = write_config(
        r#"
owner: trader-1
log_level: debug

rest:
  advanced_url: "https://advanced.test"
  exchange_url: "https://exchange.test"
  oauth_url: "https://oauth.test"
  timeout_secs: 15

stream:
  url: "wss://feed.test"
  product_ids:
    - BTC-USD
    - ETH-USD
  channels:
    - ticker
    - heartbeats
  pacing_delay_ms: 100
  ping_interval_secs: 20
  reconnect_delay_secs: 3
"#,
    );

    let config = GatewayConfig::load(file.path()).unwrap();
    assert_eq!(config.owner, "trader-1");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.rest.advanced_url, "https://advanced.test");
    assert_eq!(config.rest.timeout_secs, 15);
    // Unspecified values fall back to defaults
    assert_eq!(config.rest.connect_timeout_secs, 10);
    assert_eq!(config.stream.product_ids, vec!["BTC-USD", "ETH-USD"]);
    assert_eq!(config.stream.pacing_delay_ms, 100);
}

#[test]
fn test_empty_file_gets_all_defaults() {
    let file = write_config("{}");

    let config = GatewayConfig::load(file.path()).unwrap();
    assert_eq!(config.owner, "primary");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.stream.channels, vec!["heartbeats"]);
    assert_eq!(config.stream.reconnect_delay_secs, 5);
}

#[test]
fn test_env_var_overrides_websocket_url() {
    let file = write_config("{}");

    std::env::set_var("COINBASE_WS_URL", "wss://override.test");
    let config = GatewayConfig::load(file.path());
    std::env::remove_var("COINBASE_WS_URL");

    assert_eq!(config.unwrap().stream.url, "wss://override.test");
}

#[test]
fn test_invalid_log_level_fails_validation() {
    let file = write_config("log_level: shouting\n");

    match GatewayConfig::load(file.path()) {
        Err(ConfigError::ValidationError(message)) => {
            assert!(message.contains("log_level"));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[test]
fn test_zero_ping_interval_fails_validation() {
    let file = write_config("stream:\n  ping_interval_secs: 0\n");
    assert!(matches!(
        GatewayConfig::load(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_missing_file_is_a_file_error() {
    assert!(matches!(
        GatewayConfig::load("/nonexistent/gateway.yaml"),
        Err(ConfigError::FileError(_))
    ));
}

#[test]
fn test_malformed_yaml_is_a_parse_error() {
    let file = write_config("rest: [not, a, mapping\n");
    assert!(matches!(
        GatewayConfig::load(file.path()),
        Err(ConfigError::YamlError(_))
    ));
}
