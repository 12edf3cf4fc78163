//! Inkwire WebSocket Relay Server
//!
//! A room-scoped relay that forwards CRDT sync payloads between peers.
//! The server never inspects the payloads; convergence is the clients'
//! CRDT's job. It remembers each room's most recent sync so late joiners
//! catch up immediately.
//!
//! ## Protocol
//!
//! Messages are JSON with the following format:
//! ```json
//! { "type": "join", "room": "room-id" }
//! { "type": "leave" }
//! { "type": "sync", "data": "<base64-encoded-loro-bytes>" }
//! ```

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_PORT: u16 = 3030;
const CHANNEL_CAPACITY: usize = 256;

/// A message sent by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room
    Join { room: String },
    /// Leave current room
    Leave,
    /// Sync CRDT data (base64 encoded Loro bytes)
    Sync { data: String },
}

/// A message broadcast to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirm room join with current state
    Joined {
        room: String,
        peer_count: usize,
        /// Initial sync data (if room has history)
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_sync: Option<String>,
    },
    /// Peer joined the room
    PeerJoined { peer_id: String },
    /// Peer left the room
    PeerLeft { peer_id: String },
    /// Sync data from another peer
    Sync { from: String, data: String },
    /// Error message
    Error { message: String },
}

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<(String, ServerMessage)>,
    /// Connected peer IDs
    peers: HashSet<String>,
    /// Last sync data (for new joiners)
    last_sync: Option<String>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
            last_sync: None,
        }
    }
}

/// Shared application state
struct AppState {
    /// Active rooms
    rooms: DashMap<String, Room>,
}

impl AppState {
    fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Add peer to room
    fn join_room(
        &self,
        room_id: &str,
        peer_id: &str,
    ) -> (
        broadcast::Receiver<(String, ServerMessage)>,
        Option<String>,
        usize,
    ) {
        let mut room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(Room::new);
        room.peers.insert(peer_id.to_string());
        let rx = room.tx.subscribe();
        let initial_sync = room.last_sync.clone();
        let peer_count = room.peers.len();
        (rx, initial_sync, peer_count)
    }

    /// Remove peer from room
    fn leave_room(&self, room_id: &str, peer_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.peers.remove(peer_id);
            // Clean up empty rooms
            if room.peers.is_empty() {
                drop(room);
                self.rooms.remove(room_id);
            }
        }
    }

    /// Update room's last sync data
    fn update_sync(&self, room_id: &str, data: String) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.last_sync = Some(data);
        }
    }

    /// Broadcast message to room
    fn broadcast(&self, room_id: &str, from: &str, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(room_id) {
            let _ = room.tx.send((from.to_string(), msg));
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkwire_server=info,tower_http=info".into()),
        )
        .init();

    let port = std::env::var("INKWIRE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let state = Arc::new(AppState::new());

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Inkwire relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://localhost:{}/ws", port);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Index page
async fn index() -> &'static str {
    "Inkwire Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_room: Option<String> = None;
    let mut room_rx: Option<broadcast::Receiver<(String, ServerMessage)>> = None;

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                match client_msg {
                                    ClientMessage::Join { room } => {
                                        // Leave current room if any
                                        if let Some(ref old_room) = current_room {
                                            state.leave_room(old_room, &peer_id);
                                            state.broadcast(old_room, &peer_id, ServerMessage::PeerLeft {
                                                peer_id: peer_id.clone(),
                                            });
                                        }

                                        // Join new room
                                        let (rx, initial_sync, peer_count) = state.join_room(&room, &peer_id);
                                        room_rx = Some(rx);
                                        current_room = Some(room.clone());

                                        // Send joined confirmation
                                        let joined = ServerMessage::Joined {
                                            room: room.clone(),
                                            peer_count,
                                            initial_sync,
                                        };
                                        if sender.send(Message::Text(serde_json::to_string(&joined).unwrap().into())).await.is_err() {
                                            break;
                                        }

                                        // Notify others
                                        state.broadcast(&room, &peer_id, ServerMessage::PeerJoined {
                                            peer_id: peer_id.clone(),
                                        });

                                        info!("Peer {} joined room {}", peer_id, room);
                                    }
                                    ClientMessage::Leave => {
                                        if let Some(ref room) = current_room {
                                            state.leave_room(room, &peer_id);
                                            state.broadcast(room, &peer_id, ServerMessage::PeerLeft {
                                                peer_id: peer_id.clone(),
                                            });
                                            info!("Peer {} left room {}", peer_id, room);
                                        }
                                        current_room = None;
                                        room_rx = None;
                                    }
                                    ClientMessage::Sync { data } => {
                                        if let Some(ref room) = current_room {
                                            // Store as last sync for new joiners
                                            state.update_sync(room, data.clone());
                                            // Broadcast to others
                                            state.broadcast(room, &peer_id, ServerMessage::Sync {
                                                from: peer_id.clone(),
                                                data,
                                            });
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                warn!("Invalid message from {}: {}", peer_id, e);
                                let err = ServerMessage::Error {
                                    message: format!("Invalid message: {}", e),
                                };
                                let _ = sender.send(Message::Text(serde_json::to_string(&err).unwrap().into())).await;
                            }
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        // Binary messages are treated as raw sync data
                        if let Some(ref room) = current_room {
                            let data_b64 = BASE64.encode(&data);
                            state.update_sync(room, data_b64.clone());
                            state.broadcast(room, &peer_id, ServerMessage::Sync {
                                from: peer_id.clone(),
                                data: data_b64,
                            });
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            // Handle broadcast messages from room
            msg = async {
                match &mut room_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // No room joined, just wait forever
                        std::future::pending::<Option<(String, ServerMessage)>>().await
                    }
                }
            } => {
                if let Some((from, server_msg)) = msg {
                    // Don't echo back to sender
                    if from != peer_id {
                        let json = serde_json::to_string(&server_msg).unwrap();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    if let Some(ref room) = current_room {
        state.leave_room(room, &peer_id);
        state.broadcast(room, &peer_id, ServerMessage::PeerLeft {
            peer_id: peer_id.clone(),
        });
    }
    info!("Connection closed: {}", peer_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_creates_room_and_counts_peers() {
        let state = AppState::new();

        let (_rx_a, initial, count) = state.join_room("sketch", "a");
        assert!(initial.is_none());
        assert_eq!(count, 1);

        let (_rx_b, _, count) = state.join_room("sketch", "b");
        assert_eq!(count, 2);
        assert_eq!(state.rooms.len(), 1);
    }

    #[test]
    fn test_empty_room_is_removed() {
        let state = AppState::new();
        let (_rx_a, _, _) = state.join_room("sketch", "a");
        let (_rx_b, _, _) = state.join_room("sketch", "b");

        state.leave_room("sketch", "a");
        assert_eq!(state.rooms.len(), 1);

        state.leave_room("sketch", "b");
        assert_eq!(state.rooms.len(), 0);
    }

    #[test]
    fn test_late_joiner_gets_last_sync() {
        let state = AppState::new();
        let (_rx_a, _, _) = state.join_room("sketch", "a");
        state.update_sync("sketch", "AAAA".to_string());

        let (_rx_b, initial, _) = state.join_room("sketch", "b");
        assert_eq!(initial.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_broadcast_reaches_room_subscribers() {
        let state = AppState::new();
        let (mut rx_a, _, _) = state.join_room("sketch", "a");
        let (_rx_b, _, _) = state.join_room("sketch", "b");

        state.broadcast(
            "sketch",
            "b",
            ServerMessage::Sync {
                from: "b".to_string(),
                data: "AAAA".to_string(),
            },
        );

        let (from, msg) = rx_a.try_recv().unwrap();
        assert_eq!(from, "b");
        assert!(matches!(msg, ServerMessage::Sync { .. }));
    }

    #[test]
    fn test_broadcast_to_unknown_room_is_noop() {
        let state = AppState::new();
        state.broadcast(
            "nowhere",
            "a",
            ServerMessage::Error {
                message: "x".to_string(),
            },
        );
        assert_eq!(state.rooms.len(), 0);
    }

    #[test]
    fn test_client_message_wire_format() {
        let json = r#"{"type":"join","room":"sketch"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Join { ref room } if room == "sketch"));

        let sync = serde_json::to_string(&ServerMessage::Sync {
            from: "a".to_string(),
            data: "AAAA".to_string(),
        })
        .unwrap();
        assert!(sync.contains(r#""type":"sync""#));
    }
}
