//! WebSocket Relay Transport
//!
//! Forwards the local player's marks to a relay endpoint and hands every
//! inbound game message to the display layer unchanged.
//!
//! ```text
//!  Disconnected ──connect──▶ Connected ──close / peer closed──▶ Disconnected
//!                              │    ▲
//!                              └────┘ connect (replaces the old connection)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

use crate::game::mark::Mark;
use crate::network::protocol::GameMessage;
use crate::network::transport::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default relay endpoint.
pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:8080";

/// Default limit for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// WebSocket URL of the relay.
    pub url: String,
    /// Outgoing frames that may queue before sends fail.
    pub outgoing_buffer: usize,
    /// Limit for opening the connection.
    pub connect_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RELAY_URL.to_string(),
            outgoing_buffer: 64,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl RelayConfig {
    /// Defaults, with the URL taken from `TICTAC_RELAY_URL` when set.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("TICTAC_RELAY_URL")
                .unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            ..Default::default()
        }
    }
}

/// One live relay connection and its I/O tasks.
pub struct RelayConnection {
    /// Frames waiting for the writer task.
    outgoing: mpsc::Sender<String>,
    /// Set once the peer closed or an I/O error occurred. A closed
    /// display channel does not set it.
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl RelayConnection {
    fn spawn(ws: WsStream, sink: mpsc::Sender<GameMessage>, buffer: usize) -> Self {
        let (write, read) = ws.split();
        let (outgoing, outgoing_rx) = mpsc::channel::<String>(buffer.max(1));
        let closed = Arc::new(AtomicBool::new(false));

        let reader = tokio::spawn(forward_inbound(read, sink, closed.clone()));
        let writer = tokio::spawn(pump_outgoing(write, outgoing_rx, closed.clone()));

        Self {
            outgoing,
            closed,
            reader,
            writer,
        }
    }

    /// Whether the connection is still usable.
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && !self.writer.is_finished()
    }

    /// Stop the reader and wait until it can no longer forward anything.
    /// The writer flushes and sends a close frame on its own.
    async fn shutdown(self) {
        let reader = self.retire();
        let _ = reader.await;
    }

    /// Abort the reader and release the writer queue without waiting.
    /// The returned handle resolves once the reader is gone.
    fn retire(self) -> JoinHandle<()> {
        self.reader.abort();
        drop(self.outgoing);
        self.reader
    }
}

/// Relay connection state.
pub enum ConnectionState {
    /// No connection (initial).
    Disconnected,
    /// Live connection.
    Connected(RelayConnection),
}

/// WebSocket relay transport.
pub struct RelayTransport {
    config: RelayConfig,
    sink: mpsc::Sender<GameMessage>,
    state: ConnectionState,
    /// Readers aborted from `send`, awaited before the next connect or close.
    retired: Vec<JoinHandle<()>>,
}

impl RelayTransport {
    /// Create a disconnected relay. Inbound messages go to `sink`.
    pub fn new(config: RelayConfig, sink: mpsc::Sender<GameMessage>) -> Self {
        Self {
            config,
            sink,
            state: ConnectionState::Disconnected,
            retired: Vec::new(),
        }
    }

    /// Relay configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Whether a live connection is open.
    pub fn is_connected(&self) -> bool {
        matches!(&self.state, ConnectionState::Connected(c) if c.is_open())
    }

    /// Open a connection, replacing any existing one. On failure the
    /// existing connection (if any) is kept.
    ///
    /// When this returns, no earlier connection can forward another
    /// message to the sink.
    #[instrument(skip(self), fields(url = %self.config.url))]
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        let limit = self.config.connect_timeout;
        let (ws, _response) = timeout(limit, connect_async(self.config.url.as_str()))
            .await
            .map_err(|_| TransportError::ConnectTimeout(limit))??;

        self.reap_retired().await;
        match std::mem::replace(&mut self.state, ConnectionState::Disconnected) {
            ConnectionState::Connected(previous) => {
                info!("Replacing existing relay connection");
                previous.shutdown().await;
            }
            ConnectionState::Disconnected => info!("Relay connected"),
        }

        let connection = RelayConnection::spawn(ws, self.sink.clone(), self.config.outgoing_buffer);
        self.state = ConnectionState::Connected(connection);
        Ok(())
    }

    /// Close the connection. No-op when already disconnected.
    pub async fn close(&mut self) {
        self.reap_retired().await;
        match std::mem::replace(&mut self.state, ConnectionState::Disconnected) {
            ConnectionState::Connected(connection) => {
                info!("Relay connection closed");
                connection.shutdown().await;
            }
            ConnectionState::Disconnected => {
                debug!("Close requested while disconnected");
            }
        }
    }

    /// Send a mark to the relay.
    pub fn send(&mut self, mark: &Mark) -> Result<(), TransportError> {
        self.observe_closure();

        let ConnectionState::Connected(connection) = &self.state else {
            return Err(TransportError::NotConnected);
        };

        let text = mark.to_json()?;
        match connection.outgoing.try_send(text) {
            Ok(()) => {
                debug!(%mark, "Mark queued for relay");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(TransportError::QueueFull),
            Err(TrySendError::Closed(_)) => {
                warn!("Relay writer stopped");
                self.drop_connection();
                Err(TransportError::NotConnected)
            }
        }
    }

    /// Treat a peer-side closure like an explicit close.
    fn observe_closure(&mut self) {
        let dead = matches!(&self.state, ConnectionState::Connected(c) if !c.is_open());
        if dead {
            warn!("Relay connection lost");
            self.drop_connection();
        }
    }

    /// Synchronous close: the reader is aborted now and awaited later.
    fn drop_connection(&mut self) {
        let state = std::mem::replace(&mut self.state, ConnectionState::Disconnected);
        if let ConnectionState::Connected(connection) = state {
            self.retired.push(connection.retire());
        }
    }

    async fn reap_retired(&mut self) {
        for reader in self.retired.drain(..) {
            let _ = reader.await;
        }
    }
}

/// Reader task: decode inbound frames and forward them verbatim.
async fn forward_inbound(
    mut read: SplitStream<WsStream>,
    sink: mpsc::Sender<GameMessage>,
    closed: Arc<AtomicBool>,
) {
    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                #[cfg(feature = "debug-tracing")]
                tracing::trace!(frame = %text, "Raw relay frame");

                match GameMessage::from_json(&text) {
                    Ok(message) => {
                        debug!(kind = message.kind(), "Relay message received");
                        if sink.send(message).await.is_err() {
                            // Local shutdown; the peer is still up.
                            debug!("Display channel closed, no longer reading relay frames");
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("Dropping malformed relay message: {} - {}", e, text);
                    }
                }
            }
            Ok(Message::Close(_)) => {
                info!("Relay closed connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Relay read error: {}", e);
                break;
            }
        }
    }

    closed.store(true, Ordering::Release);
}

/// Writer task: send queued frames, then a close frame once the queue
/// is dropped.
async fn pump_outgoing(
    mut write: SplitSink<WsStream, Message>,
    mut outgoing: mpsc::Receiver<String>,
    closed: Arc<AtomicBool>,
) {
    while let Some(text) = outgoing.recv().await {
        if let Err(e) = write.send(Message::Text(text)).await {
            warn!("Relay write error: {}", e);
            closed.store(true, Ordering::Release);
            return;
        }
    }

    let _ = write.close().await;
}

/// Loopback relay peer shared by the relay and session tests.
#[cfg(test)]
pub(crate) mod loopback {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    pub(crate) type PeerStream = WebSocketStream<TcpStream>;

    /// Every accepted WebSocket is handed to the test.
    pub(crate) async fn spawn_peer() -> (String, mpsc::Receiver<PeerStream>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(4);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(ws) = accept_async(stream).await {
                    if tx.send(ws).await.is_err() {
                        break;
                    }
                }
            }
        });

        (format!("ws://{}", addr), rx)
    }

    /// Next text frame from the client, skipping control frames.
    pub(crate) async fn next_text(peer: &mut PeerStream) -> String {
        loop {
            match timeout(Duration::from_secs(5), peer.next()).await.unwrap() {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("Unexpected frame: {:?}", other),
            }
        }
    }
}
