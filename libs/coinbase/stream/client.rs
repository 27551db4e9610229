//! Streaming feed client
//!
//! One persistent websocket per client. A spawned supervisor task owns the
//! connection lifecycle; subscribe requests flow through a paced FIFO queue
//! so the upstream never sees a burst, and inbound frames fan out to the
//! handler registry in order.

use super::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, Metrics};
use super::handler::{FrameHandler, HandlerId, HandlerRegistry};
use super::reconnect::{FixedDelay, ReconnectionStrategy};
use super::subscription::{build_subscribe_frame, FeedAuth, SubscribeIntent};
use super::{FeedError, Result};
use crate::config::StreamConfig;
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Internal command messages for feed control
#[derive(Debug)]
enum FeedCommand {
    /// Queue a subscription
    Subscribe(SubscribeIntent),
    /// Shutdown the feed
    Shutdown,
}

/// Events emitted by the feed task
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Connected to the server
    Connected,
    /// Disconnected from the server
    Disconnected,
    /// Reconnecting (attempt number)
    Reconnecting(usize),
    /// A queued subscription could not be dispatched
    SubscriptionRejected(String),
    /// Error occurred
    Error(String),
}

/// Feed client configuration
#[derive(Clone)]
pub struct FeedConfig {
    pub url: String,
    pub product_ids: Vec<String>,
    pub default_channels: Vec<String>,
    pub pacing_delay: Duration,
    pub ping_interval: Duration,
    pub reconnect_delay: Duration,
    pub auth: Option<FeedAuth>,
}

impl FeedConfig {
    /// Build from the stream section of the gateway config
    pub fn from_config(stream: &StreamConfig, auth: Option<FeedAuth>) -> Self {
        Self {
            url: stream.url.clone(),
            product_ids: stream.product_ids.clone(),
            default_channels: stream.channels.clone(),
            pacing_delay: Duration::from_millis(stream.pacing_delay_ms),
            ping_interval: Duration::from_secs(stream.ping_interval_secs),
            reconnect_delay: Duration::from_secs(stream.reconnect_delay_secs),
            auth,
        }
    }
}

/// Streaming gateway client
///
/// Handlers registered here survive reconnects; the socket does not.
/// Pending subscriptions also survive, and the configured default channels
/// are re-queued on every successful connect.
pub struct FeedClient {
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    handlers: Arc<HandlerRegistry>,
    command_tx: mpsc::UnboundedSender<FeedCommand>,
    event_rx: Receiver<FeedEvent>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_flag: Arc<AtomicBool>,
}

impl FeedClient {
    /// Spawn the feed task with the default fixed-delay reconnect policy
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: FeedConfig) -> Self {
        let strategy = Box::new(FixedDelay::new(config.reconnect_delay, None));
        Self::spawn_with_strategy(config, strategy)
    }

    /// Spawn the feed task with a caller-provided reconnect policy
    pub fn spawn_with_strategy(
        config: FeedConfig,
        strategy: Box<dyn ReconnectionStrategy>,
    ) -> Self {
        let state = Arc::new(AtomicConnectionState::new(ConnectionState::Disconnected));
        let metrics = Arc::new(AtomicMetrics::new());
        let handlers = Arc::new(HandlerRegistry::new());
        let shutdown_flag = Arc::new(AtomicBool::new(true));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = unbounded();

        let task_handle = {
            let state = Arc::clone(&state);
            let metrics = Arc::clone(&metrics);
            let handlers = Arc::clone(&handlers);
            let shutdown_flag = Arc::clone(&shutdown_flag);

            tokio::spawn(async move {
                run_feed(
                    config,
                    strategy,
                    state,
                    metrics,
                    handlers,
                    command_rx,
                    event_tx,
                    shutdown_flag,
                )
                .await;
            })
        };

        Self {
            state,
            metrics,
            handlers,
            command_tx,
            event_rx,
            task_handle: Some(task_handle),
            shutdown_flag,
        }
    }

    /// Queue a subscription for paced dispatch
    pub fn subscribe(&self, intent: SubscribeIntent) -> Result<()> {
        self.command_tx
            .send(FeedCommand::Subscribe(intent))
            .map_err(|e| FeedError::ChannelSend(e.to_string()))
    }

    /// Register a frame handler, returning its removal token
    pub fn register_handler(&self, handler: Box<dyn FrameHandler>) -> HandlerId {
        self.handlers.register(handler)
    }

    /// Remove a handler, returning whether it was present
    pub fn unregister_handler(&self, id: HandlerId) -> bool {
        self.handlers.unregister(id)
    }

    /// Get current connection state
    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Check if connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        Metrics {
            frames_sent: self.metrics.frames_sent(),
            frames_received: self.metrics.frames_received(),
            reconnect_count: self.metrics.reconnect_count(),
            connection_state: self.state.get(),
        }
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<FeedEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event (blocking)
    pub fn recv_event(&self) -> std::result::Result<FeedEvent, crossbeam_channel::RecvError> {
        self.event_rx.recv()
    }

    /// Get a reference to the shutdown flag
    ///
    /// Storing `false` prevents any further reconnection attempt.
    pub fn shutdown_flag(&self) -> &Arc<AtomicBool> {
        &self.shutdown_flag
    }

    /// Shutdown the feed
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down feed client");

        self.shutdown_flag.store(false, Ordering::Release);
        self.state.set(ConnectionState::ShuttingDown);
        let _ = self.command_tx.send(FeedCommand::Shutdown);

        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }

        info!("Feed client shut down");
        Ok(())
    }
}

/// Sleep in short slices so shutdown interrupts a pending reconnect delay
///
/// Returns false when shutdown was requested during the wait.
async fn sleep_with_shutdown(duration: Duration, shutdown_flag: &AtomicBool) -> bool {
    let check_interval = Duration::from_millis(100);
    let mut elapsed = Duration::ZERO;

    while elapsed < duration {
        if !shutdown_flag.load(Ordering::Acquire) {
            debug!("Shutdown flag set during delay");
            return false;
        }

        let sleep_time = std::cmp::min(check_interval, duration - elapsed);
        tokio::time::sleep(sleep_time).await;
        elapsed += sleep_time;
    }
    true
}

/// How a session ended, seen from the supervisor
enum SessionEnd {
    /// Shutdown was requested; do not reconnect
    Shutdown,
    /// The server closed the connection; reconnect applies
    Closed,
}

/// Main feed task loop
#[allow(clippy::too_many_arguments)]
async fn run_feed(
    config: FeedConfig,
    strategy: Box<dyn ReconnectionStrategy>,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    handlers: Arc<HandlerRegistry>,
    mut command_rx: mpsc::UnboundedReceiver<FeedCommand>,
    event_tx: Sender<FeedEvent>,
    shutdown_flag: Arc<AtomicBool>,
) {
    let mut reconnect_attempt = 0;
    // The queue outlives individual sockets; pending intents survive
    let mut queue: VecDeque<SubscribeIntent> = VecDeque::new();

    loop {
        if !shutdown_flag.load(Ordering::Acquire) {
            debug!("Shutdown flag is false, exiting feed loop");
            break;
        }
        if state.is_shutting_down() {
            debug!("Feed is shutting down, exiting feed loop");
            break;
        }

        if reconnect_attempt > 0 {
            let _ = event_tx.send(FeedEvent::Reconnecting(reconnect_attempt));
        }
        state.set(ConnectionState::Connecting);

        match connect_async(&config.url).await {
            Ok((ws_stream, _)) => {
                info!("Connected to {}", config.url);
                state.set(ConnectionState::Open);
                let _ = event_tx.send(FeedEvent::Connected);

                reconnect_attempt = 0;

                // Default channels go out on every connect
                for channel in &config.default_channels {
                    queue.push_back(SubscribeIntent::new(
                        vec![channel.clone()],
                        config.product_ids.clone(),
                    ));
                }

                match run_session(
                    ws_stream,
                    &config,
                    &state,
                    &metrics,
                    &handlers,
                    &mut queue,
                    &mut command_rx,
                    &event_tx,
                    &shutdown_flag,
                )
                .await
                {
                    Ok(SessionEnd::Shutdown) => {
                        state.set(ConnectionState::ShuttingDown);
                    }
                    Ok(SessionEnd::Closed) => {
                        state.set(ConnectionState::Closing);
                    }
                    Err(e) => {
                        error!("Feed session error: {}", e);
                        let _ = event_tx.send(FeedEvent::Error(e.to_string()));
                        state.set(ConnectionState::Errored);
                    }
                }

                let _ = event_tx.send(FeedEvent::Disconnected);
            }
            Err(e) => {
                error!("Failed to connect: {}", e);
                let _ = event_tx.send(FeedEvent::Error(e.to_string()));
                state.set(ConnectionState::Errored);
            }
        }

        if !shutdown_flag.load(Ordering::Acquire) {
            debug!("Shutdown flag set during connection, stopping reconnection");
            break;
        }
        if state.is_shutting_down() {
            break;
        }

        match strategy.next_delay(reconnect_attempt) {
            Some(delay) => {
                info!(
                    "Reconnecting in {:?} (attempt {})",
                    delay,
                    reconnect_attempt + 1
                );
                state.set(ConnectionState::Reconnecting);

                if !sleep_with_shutdown(delay, &shutdown_flag).await {
                    break;
                }

                reconnect_attempt += 1;
                metrics.increment_reconnects();
            }
            None => {
                warn!("Reconnection strategy exhausted, stopping");
                break;
            }
        }
    }

    state.set(ConnectionState::Disconnected);
    info!("Feed task exiting");
}

/// Drive one live socket until it closes or shutdown is requested
#[allow(clippy::too_many_arguments)]
async fn run_session(
    ws_stream: WsStream,
    config: &FeedConfig,
    state: &AtomicConnectionState,
    metrics: &AtomicMetrics,
    handlers: &HandlerRegistry,
    queue: &mut VecDeque<SubscribeIntent>,
    command_rx: &mut mpsc::UnboundedReceiver<FeedCommand>,
    event_tx: &Sender<FeedEvent>,
    shutdown_flag: &AtomicBool,
) -> Result<SessionEnd> {
    let (mut write, mut read): (WsSink, WsSource) = ws_stream.split();

    let mut ping = tokio::time::interval(config.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick fires immediately; a ping right after connect is noise
    ping.tick().await;

    // First queued subscribe goes out at once, later ones are paced
    let mut ready_at = Instant::now();

    loop {
        if !shutdown_flag.load(Ordering::Acquire) {
            debug!("Shutdown flag detected in session loop, closing connection");
            let _ = write.close().await;
            return Ok(SessionEnd::Shutdown);
        }
        if state.is_shutting_down() {
            debug!("Shutting down state detected in session loop, closing connection");
            let _ = write.close().await;
            return Ok(SessionEnd::Shutdown);
        }

        tokio::select! {
            // Inbound frames
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        metrics.increment_received();
                        handle_frame(&text, handlers);
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        write.send(Message::Pong(payload)).await.map_err(|e| {
                            FeedError::WebSocket(format!("Failed to send pong: {}", e))
                        })?;
                        metrics.increment_sent();
                    }
                    Some(Ok(Message::Close(_))) => {
                        warn!("Server closed the connection");
                        return Ok(SessionEnd::Closed);
                    }
                    Some(Ok(_)) => {
                        debug!("Ignoring non-text frame");
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        return Err(FeedError::WebSocket(e.to_string()));
                    }
                    None => {
                        warn!("WebSocket stream closed");
                        return Err(FeedError::ConnectionClosed("Stream ended".to_string()));
                    }
                }
            }

            // Control commands
            cmd = command_rx.recv() => {
                match cmd {
                    Some(FeedCommand::Subscribe(intent)) => {
                        queue.push_back(intent);
                    }
                    Some(FeedCommand::Shutdown) => {
                        info!("Received shutdown command");
                        let _ = write.close().await;
                        return Ok(SessionEnd::Shutdown);
                    }
                    None => {
                        debug!("Command channel closed");
                        let _ = write.close().await;
                        return Ok(SessionEnd::Shutdown);
                    }
                }
            }

            // Paced subscribe dispatch; the guard keeps the timer quiet
            // while the queue is empty
            _ = sleep_until(ready_at), if !queue.is_empty() => {
                if let Some(intent) = queue.pop_front() {
                    match build_subscribe_frame(&intent, config.auth.as_ref()).await {
                        Ok(frame) => {
                            let text = serde_json::to_string(&frame).map_err(|e| {
                                FeedError::WebSocket(format!("Failed to encode subscribe: {}", e))
                            })?;
                            // A failed send never halts the queue; a dead
                            // socket surfaces through the read side
                            match write.send(Message::Text(text)).await {
                                Ok(()) => {
                                    metrics.increment_sent();
                                    debug!(
                                        "Subscribed to {:?} ({} products)",
                                        intent.channels,
                                        intent.product_ids.len()
                                    );
                                }
                                Err(e) => {
                                    warn!("Failed to send subscribe: {}", e);
                                    let _ = event_tx.send(FeedEvent::Error(e.to_string()));
                                }
                            }
                            ready_at = Instant::now() + config.pacing_delay;
                        }
                        Err(e) => {
                            // The pacing gate only advances on a send attempt
                            warn!("Dropping subscription: {}", e);
                            let _ = event_tx.send(FeedEvent::SubscriptionRejected(e.to_string()));
                        }
                    }
                }
            }

            // Keep-alive ping
            _ = ping.tick() => {
                let text = serde_json::json!({ "type": "ping" }).to_string();
                write.send(Message::Text(text)).await.map_err(|e| {
                    FeedError::WebSocket(format!("Failed to send ping: {}", e))
                })?;
                metrics.increment_sent();
                debug!("Ping sent");
            }
        }
    }
}

/// Classify one inbound frame and fan it out
fn handle_frame(text: &str, handlers: &HandlerRegistry) {
    let frame: Value = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Discarding unparseable frame: {}", e);
            return;
        }
    };

    match frame.get("type").and_then(Value::as_str) {
        // Keep-alive replies stay inside the gateway
        Some("pong") => {
            debug!("Pong received");
            return;
        }
        Some("subscriptions") => {
            info!("Subscription state: {}", text);
        }
        Some("error") => {
            error!("Feed error frame: {}", text);
        }
        _ => {}
    }

    handlers.dispatch(&frame);
}
