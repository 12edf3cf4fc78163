//! Wire protocol and WebSocket transport for collaboration.
//!
//! The relay carries JSON messages; CRDT payloads ride inside them as
//! base64 strings. The transport is deliberately dumb: it only moves
//! text and reports connection state. Decoding and log import happen in
//! [`crate::collaboration::RoomSession`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Messages sent to the relay server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room.
    Join { room: String },
    /// Leave the current room.
    Leave,
    /// Replicated log payload (base64-encoded Loro bytes).
    Sync { data: String },
}

/// Messages received from the relay server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Room join confirmed, with the room's latest state if it has any.
    Joined {
        room: String,
        peer_count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_sync: Option<String>,
    },
    /// Another peer joined the room.
    PeerJoined { peer_id: String },
    /// Another peer left the room.
    PeerLeft { peer_id: String },
    /// Log payload from another peer.
    Sync { from: String, data: String },
    /// Server-side error.
    Error { message: String },
}

/// Connection state of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events surfaced by the collaboration layer.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Joined a room (initial state, if any, has been imported).
    JoinedRoom { room: String, peer_count: usize },
    /// A peer joined the room.
    PeerJoined { peer_id: String },
    /// A peer left the room.
    PeerLeft { peer_id: String },
    /// A remote payload landed and changed the log.
    LogUpdated { from: String },
    /// Error reported by the server.
    Error { message: String },
}

/// Transport failures. None of these are fatal to the session; a failed
/// transport simply means the log does not change until reconnection.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("invalid relay url: {0}")]
    InvalidUrl(String),
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Raw events from the WebSocket transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// A text frame from the server, undecoded.
    Message(String),
    Error(String),
}

#[cfg(not(target_arch = "wasm32"))]
mod native_client {
    use super::*;
    use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{connect, Message};
    use url::Url;

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket client backed by a background thread, so the
    /// single-threaded core never blocks on the network. Events are
    /// drained with [`poll_events`](RelayClient::poll_events).
    pub struct RelayClient {
        state: ConnectionState,
        cmd_tx: Option<Sender<WsCommand>>,
        event_rx: Option<Receiver<TransportEvent>>,
        _thread: Option<JoinHandle<()>>,
    }

    impl RelayClient {
        /// Create a new disconnected client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }

        /// Connect to the relay server at `url` (`ws://` or `wss://`).
        pub fn connect(&mut self, url: &str) -> Result<(), SyncError> {
            if self.cmd_tx.is_some() {
                return Err(SyncError::AlreadyConnected);
            }

            let parsed = Url::parse(url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
            if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
                return Err(SyncError::InvalidUrl(format!(
                    "unsupported scheme: {}",
                    parsed.scheme()
                )));
            }

            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<TransportEvent>();
            let url = url.to_string();

            let handle = thread::spawn(move || run_socket(&url, &cmd_rx, &event_tx));

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);
            Ok(())
        }

        /// Disconnect from the server.
        pub fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        /// Queue a text frame for sending.
        pub fn send(&self, msg: &str) -> Result<(), SyncError> {
            let tx = self.cmd_tx.as_ref().ok_or(SyncError::NotConnected)?;
            tx.send(WsCommand::Send(msg.to_string()))
                .map_err(|e| SyncError::SendFailed(e.to_string()))
        }

        /// Drain pending transport events (non-blocking).
        pub fn poll_events(&mut self) -> Vec<TransportEvent> {
            let mut events = Vec::new();
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    match &event {
                        TransportEvent::Connected => self.state = ConnectionState::Connected,
                        TransportEvent::Disconnected => self.state = ConnectionState::Disconnected,
                        TransportEvent::Error(_) => self.state = ConnectionState::Error,
                        TransportEvent::Message(_) => {}
                    }
                    events.push(event);
                }
            }
            events
        }

        pub fn state(&self) -> ConnectionState {
            self.state
        }

        pub fn is_connected(&self) -> bool {
            self.state == ConnectionState::Connected
        }
    }

    impl Default for RelayClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for RelayClient {
        fn drop(&mut self) {
            self.disconnect();
        }
    }

    /// Socket loop run on the background thread.
    fn run_socket(url: &str, cmd_rx: &Receiver<WsCommand>, event_tx: &Sender<TransportEvent>) {
        log::info!("relay client connecting to {url}");

        let (mut socket, response) = match connect(url) {
            Ok(ok) => ok,
            Err(e) => {
                log::error!("relay connection failed: {e}");
                let _ = event_tx.send(TransportEvent::Error(format!("connection failed: {e}")));
                return;
            }
        };
        log::info!("relay connected, status: {}", response.status());
        let _ = event_tx.send(TransportEvent::Connected);

        // Short read timeout so the loop can interleave sends and reads
        if let tungstenite::stream::MaybeTlsStream::Plain(tcp) = socket.get_mut() {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }

        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(msg)) => {
                    if let Err(e) = socket.send(Message::Text(msg)) {
                        log::error!("relay send error: {e}");
                        break;
                    }
                }
                Ok(WsCommand::Close) | Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            match socket.read() {
                Ok(Message::Text(txt)) => {
                    let _ = event_tx.send(TransportEvent::Message(txt.to_string()));
                }
                Ok(Message::Ping(data)) => {
                    let _ = socket.send(Message::Pong(data));
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    log::error!("relay read error: {e}");
                    break;
                }
            }
        }

        log::info!("relay client thread exiting");
        let _ = event_tx.send(TransportEvent::Disconnected);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_client::RelayClient;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_serialize() {
        let msg = ClientMessage::Join {
            room: "test-room".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"join""#));
        assert!(json.contains("test-room"));
    }

    #[test]
    fn test_server_message_deserialize() {
        let json = r#"{"type":"joined","room":"test","peer_count":2}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        match msg {
            ServerMessage::Joined {
                room,
                peer_count,
                initial_sync,
            } => {
                assert_eq!(room, "test");
                assert_eq!(peer_count, 2);
                assert!(initial_sync.is_none());
            }
            _ => panic!("wrong message type"),
        }
    }

    #[test]
    fn test_sync_message_roundtrip() {
        let msg = ServerMessage::Sync {
            from: "peer-1".to_string(),
            data: "AAEC".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: ServerMessage = serde_json::from_str(&json).unwrap();
        match back {
            ServerMessage::Sync { from, data } => {
                assert_eq!(from, "peer-1");
                assert_eq!(data, "AAEC");
            }
            _ => panic!("wrong message type"),
        }
    }

    #[test]
    fn test_connect_rejects_bad_scheme() {
        let mut client = RelayClient::new();
        assert!(matches!(
            client.connect("http://localhost:3030/ws"),
            Err(SyncError::InvalidUrl(_))
        ));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_send_requires_connection() {
        let client = RelayClient::new();
        assert!(matches!(client.send("hello"), Err(SyncError::NotConnected)));
    }
}
