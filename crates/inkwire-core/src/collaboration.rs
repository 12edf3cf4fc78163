//! Room session: binds the CRDT stroke log to the relay wire protocol.
//!
//! Owns the shared log for one room, queues outgoing wire messages, and
//! turns inbound server messages into log imports. Peers in different
//! rooms never share a log instance; room scoping is enforced by the
//! relay server.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::log::CrdtStrokeLog;
use crate::sync::{ClientMessage, ServerMessage, SyncEvent};

/// Default room name when none is configured.
pub const DEFAULT_ROOM: &str = "default-room";

/// Collaboration state for one peer in one room.
pub struct RoomSession {
    /// The shared stroke log, replicated to every peer in the room.
    log: CrdtStrokeLog,
    /// Room this session wants to be in.
    room: String,
    /// Room the server has confirmed, if any.
    joined: Option<String>,
    /// Pending outgoing wire messages (JSON strings).
    outgoing: Vec<String>,
}

impl RoomSession {
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            log: CrdtStrokeLog::new(),
            room: room.into(),
            joined: None,
            outgoing: Vec::new(),
        }
    }

    pub fn log(&self) -> &CrdtStrokeLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut CrdtStrokeLog {
        &mut self.log
    }

    /// This replica's peer id (from Loro).
    pub fn peer_id(&self) -> u64 {
        self.log.peer_id()
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// The room the server has confirmed, if any.
    pub fn joined_room(&self) -> Option<&str> {
        self.joined.as_deref()
    }

    pub fn is_joined(&self) -> bool {
        self.joined.is_some()
    }

    /// Queue a join request for the configured room.
    pub fn request_join(&mut self) {
        self.queue(&ClientMessage::Join {
            room: self.room.clone(),
        });
    }

    /// Queue a leave request and forget the joined room.
    pub fn leave(&mut self) {
        if self.joined.take().is_some() {
            self.queue(&ClientMessage::Leave);
        }
    }

    /// Queue a sync broadcast carrying the full current log state.
    ///
    /// Full snapshots are idempotent under Loro import, so delivery may
    /// be delayed, reordered, or duplicated without harm.
    pub fn broadcast_sync(&mut self) {
        if self.joined.is_none() {
            return;
        }
        let data = BASE64.encode(self.log.export_snapshot());
        self.queue(&ClientMessage::Sync { data });
    }

    /// Drain pending outgoing messages.
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    fn queue(&mut self, msg: &ClientMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => self.outgoing.push(json),
            Err(e) => log::error!("failed to encode outgoing message: {e}"),
        }
    }

    /// Handle an inbound server frame. Payloads that fail to parse,
    /// decode, or import are dropped; they can never corrupt the log.
    pub fn handle_message(&mut self, json: &str) -> Option<SyncEvent> {
        let msg: ServerMessage = match serde_json::from_str(json) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("dropping unparseable server frame: {e}");
                return None;
            }
        };

        match msg {
            ServerMessage::Joined {
                room,
                peer_count,
                initial_sync,
            } => {
                self.joined = Some(room.clone());
                if let Some(data) = initial_sync {
                    self.import_payload(&data);
                }
                Some(SyncEvent::JoinedRoom { room, peer_count })
            }
            ServerMessage::PeerJoined { peer_id } => Some(SyncEvent::PeerJoined { peer_id }),
            ServerMessage::PeerLeft { peer_id } => Some(SyncEvent::PeerLeft { peer_id }),
            ServerMessage::Sync { from, data } => {
                if self.import_payload(&data) {
                    Some(SyncEvent::LogUpdated { from })
                } else {
                    None
                }
            }
            ServerMessage::Error { message } => Some(SyncEvent::Error { message }),
        }
    }

    /// Decode and import a base64 payload. Returns whether the log changed.
    fn import_payload(&mut self, data: &str) -> bool {
        match BASE64.decode(data) {
            Ok(bytes) => self.log.import_remote(&bytes),
            Err(e) => {
                log::warn!("dropping undecodable sync payload: {e}");
                false
            }
        }
    }
}

impl Default for RoomSession {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM)
    }
}
