//! Integration tests for paced subscription dispatch and handler fan-out

mod common;

use common::MockFeedServer;
use coinbase::stream::{FeedClient, FeedConfig, SubscribeIntent};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn feed_config(url: String) -> FeedConfig {
    FeedConfig {
        url,
        product_ids: vec!["BTC-USD".to_string()],
        default_channels: Vec::new(),
        pacing_delay: Duration::from_millis(200),
        // Keep the keep-alive quiet during short tests
        ping_interval: Duration::from_secs(60),
        reconnect_delay: Duration::from_millis(200),
        auth: None,
    }
}

async fn wait_for_connected(client: &FeedClient) {
    for _ in 0..50 {
        if client.is_connected() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("feed never connected");
}

#[tokio::test]
async fn test_subscriptions_dispatch_in_order_with_pacing() {
    let server = MockFeedServer::start().await;
    let client = FeedClient::spawn(feed_config(server.ws_url()));
    wait_for_connected(&client).await;

    for i in 0..5 {
        client
            .subscribe(SubscribeIntent::new(
                vec![format!("channel-{}", i)],
                vec!["BTC-USD".to_string()],
            ))
            .unwrap();
    }

    // 5 frames at 200ms pacing finish well inside 2s
    tokio::time::sleep(Duration::from_secs(2)).await;

    let frames = server.received();
    let subscribes: Vec<_> = frames
        .iter()
        .filter(|(_, text)| text.contains("subscribe"))
        .collect();
    assert_eq!(subscribes.len(), 5, "every queued intent must dispatch");

    for (i, (_, text)) in subscribes.iter().enumerate() {
        let frame: Value = serde_json::from_str(text).unwrap();
        assert_eq!(frame["type"], "subscribe");
        assert_eq!(
            frame["channel"],
            format!("channel-{}", i),
            "dispatch order must match submission order"
        );
    }

    for pair in subscribes.windows(2) {
        let gap = pair[1].0.duration_since(pair[0].0);
        verbose_println!("  Gap between dispatches: {:?}", gap);
        assert!(
            gap >= Duration::from_millis(150),
            "dispatches must be paced, got a {:?} gap",
            gap
        );
    }

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_default_channels_subscribe_on_connect() {
    let server = MockFeedServer::start().await;
    let mut config = feed_config(server.ws_url());
    config.default_channels = vec!["heartbeats".to_string()];

    let client = FeedClient::spawn(config);
    wait_for_connected(&client).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let frames = server.received();
    assert!(
        frames.iter().any(|(_, text)| {
            serde_json::from_str::<Value>(text)
                .map(|f| f["type"] == "subscribe" && f["channel"] == "heartbeats")
                .unwrap_or(false)
        }),
        "default channel must be subscribed without an explicit request"
    );

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_pong_stays_internal_and_fanout_survives_errors() {
    let script = vec![
        r#"{"type":"pong"}"#.to_string(),
        r#"{"type":"ticker","product_id":"BTC-USD","price":"45000.00"}"#.to_string(),
    ];
    let server = MockFeedServer::start_with_script(script).await;
    let client = FeedClient::spawn(feed_config(server.ws_url()));

    let seen: Arc<Mutex<Vec<(&'static str, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&seen);
    client.register_handler(Box::new(move |frame: &Value| {
        let kind = frame["type"].as_str().unwrap_or("?").to_string();
        first.lock().push(("first", kind));
        Err(coinbase::stream::FeedError::WebSocket(
            "handler failure".to_string(),
        ))
    }));

    let second = Arc::clone(&seen);
    client.register_handler(Box::new(move |frame: &Value| {
        let kind = frame["type"].as_str().unwrap_or("?").to_string();
        second.lock().push(("second", kind));
        Ok(())
    }));

    wait_for_connected(&client).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    let observed = seen.lock().clone();
    verbose_println!("  Observed deliveries: {:?}", observed);

    assert!(
        observed.iter().all(|(_, kind)| kind != "pong"),
        "pong frames must never reach handlers"
    );
    assert_eq!(
        observed,
        vec![
            ("first", "ticker".to_string()),
            ("second", "ticker".to_string())
        ],
        "both handlers must see the frame in registration order"
    );

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_protocol_frames_still_reach_handlers() {
    let script = vec![
        r#"{"type":"subscriptions","channels":[{"name":"ticker","product_ids":["BTC-USD"]}]}"#
            .to_string(),
        r#"{"type":"error","message":"authentication failure"}"#.to_string(),
    ];
    let server = MockFeedServer::start_with_script(script).await;
    let client = FeedClient::spawn(feed_config(server.ws_url()));

    let kinds: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&kinds);
    client.register_handler(Box::new(move |frame: &Value| {
        sink.lock()
            .push(frame["type"].as_str().unwrap_or("?").to_string());
        Ok(())
    }));

    wait_for_connected(&client).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    let observed = kinds.lock().clone();
    verbose_println!("  Observed frame kinds: {:?}", observed);
    assert_eq!(
        observed,
        vec!["subscriptions".to_string(), "error".to_string()],
        "confirmations and upstream errors must still fan out"
    );

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unregistered_handler_stops_receiving() {
    let script = vec![r#"{"type":"ticker","sequence":1}"#.to_string()];
    let server = MockFeedServer::start_with_script(script).await;
    let client = FeedClient::spawn(feed_config(server.ws_url()));

    let calls: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let id = client.register_handler(Box::new(move |_: &Value| {
        *counter.lock() += 1;
        Ok(())
    }));

    wait_for_connected(&client).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let after_first = *calls.lock();
    assert!(after_first >= 1, "handler must see the scripted frame");

    assert!(client.unregister_handler(id));
    assert!(!client.unregister_handler(id));

    client.shutdown().await.unwrap();
}
