//! Common test utilities for gateway integration tests

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// A mock feed server recording every text frame it receives
///
/// Replies to `{"type":"ping"}` with `{"type":"pong"}` and to protocol
/// pings with pongs. Scripted frames are pushed to each client shortly
/// after the handshake settles.
pub struct MockFeedServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    received: Arc<Mutex<Vec<(Instant, String)>>>,
}

impl MockFeedServer {
    pub async fn start() -> Self {
        Self::start_with_script(Vec::new()).await
    }

    pub async fn start_with_script(script: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::run(listener, script).await
    }

    /// Start on a specific port, for reviving a server a client knows
    pub async fn start_on(addr: SocketAddr, script: Vec<String>) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        Self::run(listener, script).await
    }

    async fn run(listener: TcpListener, script: Vec<String>) -> Self {
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let received: Arc<Mutex<Vec<(Instant, String)>>> = Arc::new(Mutex::new(Vec::new()));

        let shutdown_accept = shutdown.clone();
        let received_accept = received.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_accept.clone();
                                let received = received_accept.clone();
                                let script = script.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown, received, script)
                                        .await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_accept.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            received,
        }
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        shutdown: Arc<Notify>,
        received: Arc<Mutex<Vec<(Instant, String)>>>,
        script: Vec<String>,
    ) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        if !script.is_empty() {
            // Give the client a moment to finish wiring up handlers
            tokio::time::sleep(Duration::from_millis(100)).await;
            for frame in &script {
                if write.send(Message::Text(frame.clone())).await.is_err() {
                    return;
                }
            }
        }

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            received.lock().push((Instant::now(), text.clone()));

                            let is_ping = serde_json::from_str::<serde_json::Value>(&text)
                                .ok()
                                .and_then(|v| v.get("type").and_then(|t| t.as_str().map(String::from)))
                                .map(|t| t == "ping")
                                .unwrap_or(false);
                            if is_ping {
                                let pong = r#"{"type":"pong"}"#.to_string();
                                if write.send(Message::Text(pong)).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            if write.send(Message::Pong(payload)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) => break,
                        Some(Ok(_)) => {}
                        Some(Err(_)) | None => break,
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Snapshot of every text frame received so far
    pub fn received(&self) -> Vec<(Instant, String)> {
        self.received.lock().clone()
    }

    /// Shutdown the server and its live connections
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockFeedServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
