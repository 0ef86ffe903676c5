//! Collector client and event loop.
//!
//! This module owns the single WebSocket connection to the collector,
//! including connect retries and request/response correlation.
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──connect()──► Connecting ──open──► Open
//!      ▲                          │                 │
//!      └──── retries exhausted ───┘                 │
//!      └──────────── close() / remote close / error ┘
//! ```
//!
//! # Event Loop
//!
//! Once open, the connection spawns a tokio task that handles:
//!
//! - Outgoing frames from [`CollectorClient::send_with_response`]
//! - Incoming replies, matched to pending requests by `messageId`
//! - Shutdown on [`CollectorClient::close`]

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Value, from_str};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use crate::config::CollectorConfig;
use crate::error::{Error, Result};
use crate::identifiers::MessageId;
use crate::protocol::{MESSAGE_ID_KEY, Reply};

use super::connector::{Connector, WsConnector, WsStream};

// ============================================================================
// Types
// ============================================================================

/// Map of message ids to response channels.
type PendingMap = FxHashMap<MessageId, oneshot::Sender<Result<Reply>>>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the collector connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket.
    Disconnected,
    /// A connect attempt is in progress.
    Connecting,
    /// Socket open; sends permitted.
    Open,
    /// Close requested; the event loop is winding down.
    Closing,
}

// ============================================================================
// ClientCommand
// ============================================================================

/// Internal commands for the event loop.
enum ClientCommand {
    /// Transmit a serialized request.
    Send { message_id: MessageId, text: String },
    /// Close the socket and stop.
    Shutdown,
}

// ============================================================================
// PendingSlot
// ============================================================================

/// Pending-request registration, removed when dropped.
///
/// Whichever of {reply, timeout, cancellation} comes first removes the
/// entry; later removals are no-ops.
struct PendingSlot<'a> {
    pending: &'a Mutex<PendingMap>,
    message_id: MessageId,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.message_id);
    }
}

// ============================================================================
// CollectorClient
// ============================================================================

/// Persistent duplex connection to the remote collector.
///
/// One instance per collection run. Sends are strictly sequential in
/// practice, but correlation is by `messageId` so replies are never matched
/// by arrival order.
///
/// # Example
///
/// ```ignore
/// let client = CollectorClient::new(&config);
/// client.connect().await?;
/// let reply = client
///     .send_with_response(&Request::SaveTranscript(unit), Duration::from_secs(5))
///     .await?;
/// client.close().await;
/// ```
pub struct CollectorClient {
    /// Collector address.
    endpoint: String,
    /// Total connect attempts.
    max_retries: u32,
    /// Backoff unit between attempts.
    retry_base_delay: Duration,
    /// Per-attempt open timeout.
    connect_timeout: Duration,
    /// Dialer.
    connector: Box<dyn Connector>,
    /// Current state (shared with event loop).
    state: Arc<Mutex<ConnectionState>>,
    /// Outstanding requests (shared with event loop).
    pending: Arc<Mutex<PendingMap>>,
    /// Channel to the event loop while open.
    command_tx: Mutex<Option<mpsc::UnboundedSender<ClientCommand>>>,
    /// Event loop task while open.
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CollectorClient {
    /// Creates a disconnected client using the default WebSocket dialer.
    #[must_use]
    pub fn new(config: &CollectorConfig) -> Self {
        Self::with_connector(config, WsConnector)
    }

    /// Creates a disconnected client with a custom dialer.
    #[must_use]
    pub fn with_connector(config: &CollectorConfig, connector: impl Connector + 'static) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            max_retries: config.max_retries.max(1),
            retry_base_delay: config.retry_base_delay,
            connect_timeout: config.timeouts.connect,
            connector: Box::new(connector),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            pending: Arc::new(Mutex::new(PendingMap::default())),
            command_tx: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Returns the collector address.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Returns `true` iff the connection is open.
    #[inline]
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Returns the number of requests awaiting a reply.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Opens the connection, retrying with linear backoff.
    ///
    /// Makes at most `max_retries` attempts; the delay after attempt `n` is
    /// `n × retry_base_delay`. Each attempt is bounded by the connect
    /// timeout. Returns immediately if already open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionFailed`] once every attempt has failed.
    pub async fn connect(&self) -> Result<()> {
        if self.is_healthy() {
            return Ok(());
        }

        *self.state.lock() = ConnectionState::Connecting;

        for attempt in 1..=self.max_retries {
            debug!(endpoint = %self.endpoint, attempt, max = self.max_retries, "Connecting");

            match timeout(self.connect_timeout, self.connector.open(&self.endpoint)).await {
                Ok(Ok(stream)) => {
                    self.attach(stream);
                    info!(endpoint = %self.endpoint, attempt, "Connected to collector");
                    return Ok(());
                }
                Ok(Err(e)) => {
                    warn!(
                        endpoint = %self.endpoint,
                        attempt,
                        max = self.max_retries,
                        error = %e,
                        "Connect attempt failed"
                    );
                }
                Err(_) => {
                    warn!(
                        endpoint = %self.endpoint,
                        attempt,
                        max = self.max_retries,
                        timeout_ms = self.connect_timeout.as_millis() as u64,
                        "Connect attempt timed out"
                    );
                }
            }

            if attempt < self.max_retries {
                let delay = self.retry_base_delay * attempt;
                debug!(delay_ms = delay.as_millis() as u64, "Retrying connection");
                sleep(delay).await;
            }
        }

        *self.state.lock() = ConnectionState::Disconnected;
        Err(Error::connection_failed(&self.endpoint, self.max_retries))
    }

    /// Sends `payload` with a fresh `messageId` and waits for the reply
    /// carrying the same id.
    ///
    /// Replies with other ids are ignored. A remote-reported error is still
    /// a reply; inspect [`Reply::is_error`].
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is not open (nothing sent)
    /// - [`Error::Protocol`] if `payload` does not serialize to a JSON object
    /// - [`Error::ResponseTimeout`] if no reply arrives within `response_timeout`
    /// - [`Error::ConnectionClosed`] if the connection drops while waiting
    pub async fn send_with_response<T>(&self, payload: &T, response_timeout: Duration) -> Result<Reply>
    where
        T: Serialize + ?Sized,
    {
        if !self.is_healthy() {
            return Err(Error::NotConnected);
        }

        let message_id = MessageId::generate();

        let mut value = serde_json::to_value(payload)?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| Error::protocol("payload must serialize to a JSON object"))?;
        object.insert(
            MESSAGE_ID_KEY.to_string(),
            Value::String(message_id.as_str().to_string()),
        );
        let text = value.to_string();

        let command_tx = self.command_tx.lock().clone().ok_or(Error::NotConnected)?;

        let (response_tx, response_rx) = oneshot::channel();
        self.pending.lock().insert(message_id.clone(), response_tx);
        let _slot = PendingSlot {
            pending: &self.pending,
            message_id: message_id.clone(),
        };

        command_tx
            .send(ClientCommand::Send {
                message_id: message_id.clone(),
                text,
            })
            .map_err(|_| Error::NotConnected)?;

        trace!(%message_id, "Awaiting reply");

        match timeout(response_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                debug!(%message_id, "Reply timed out");
                Err(Error::response_timeout(
                    message_id,
                    response_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Closes the connection and waits for the event loop to stop.
    ///
    /// Idempotent; outstanding requests fail with
    /// [`Error::ConnectionClosed`].
    pub async fn close(&self) {
        let command_tx = self.command_tx.lock().take();
        let task = self.task.lock().take();

        if command_tx.is_none() && task.is_none() {
            *self.state.lock() = ConnectionState::Disconnected;
            return;
        }

        *self.state.lock() = ConnectionState::Closing;

        if let Some(command_tx) = command_tx {
            let _ = command_tx.send(ClientCommand::Shutdown);
        }

        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!(error = %e, "Event loop ended abnormally");
        }

        *self.state.lock() = ConnectionState::Disconnected;
        debug!(endpoint = %self.endpoint, "Connection closed");
    }

    /// Starts the event loop on an open stream.
    fn attach(&self, stream: WsStream) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        *self.state.lock() = ConnectionState::Open;
        *self.command_tx.lock() = Some(command_tx);

        let task = tokio::spawn(Self::run_event_loop(
            stream,
            command_rx,
            Arc::clone(&self.pending),
            Arc::clone(&self.state),
        ));
        *self.task.lock() = Some(task);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ClientCommand>,
        pending: Arc<Mutex<PendingMap>>,
        state: Arc<Mutex<ConnectionState>>,
    ) {
        let (mut ws_write, mut ws_read) = stream.split();

        loop {
            tokio::select! {
                // Incoming replies from the collector
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &pending);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the client
                command = command_rx.recv() => {
                    match command {
                        Some(ClientCommand::Send { message_id, text }) => {
                            if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                if let Some(tx) = pending.lock().remove(&message_id) {
                                    let _ = tx.send(Err(Error::WebSocket(e)));
                                }
                                break;
                            }
                            trace!(%message_id, "Request sent");
                        }

                        Some(ClientCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        {
            let mut state = state.lock();
            if *state == ConnectionState::Open {
                *state = ConnectionState::Disconnected;
            }
        }

        Self::fail_pending_requests(&pending);

        debug!("Event loop terminated");
    }

    /// Routes a reply to the request it answers.
    fn handle_incoming_message(text: &str, pending: &Mutex<PendingMap>) {
        let value: Value = match from_str(text) {
            Ok(value) => value,
            Err(_) => {
                warn!(text = %text, "Ignoring non-JSON message");
                return;
            }
        };

        let Some(message_id) = value.get(MESSAGE_ID_KEY).and_then(Value::as_str) else {
            trace!("Ignoring message without messageId");
            return;
        };
        let message_id = MessageId::new(message_id);

        let Some(tx) = pending.lock().remove(&message_id) else {
            debug!(%message_id, "Ignoring reply for unknown request");
            return;
        };

        let _ = tx.send(Reply::from_value(value));
    }

    /// Fails all pending requests with ConnectionClosed error.
    fn fail_pending_requests(pending: &Mutex<PendingMap>) {
        let drained: Vec<_> = pending.lock().drain().collect();
        let count = drained.len();

        for (_, tx) in drained {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
