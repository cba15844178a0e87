//! The Matrix - central shared state for the chat server.
//!
//! The Matrix owns the session registry, room directory, moderation store,
//! and lifecycle signalling. One instance is built at startup and handed to
//! every connection task as `Arc<Matrix>`.

use crate::config::{AddressMode, Config};
use crate::state::managers::lifecycle::LifecycleManager;
use crate::state::managers::moderation::ModerationStore;
use crate::state::managers::room::RoomDirectory;
use crate::state::managers::session::SessionRegistry;
use crate::state::room::GENERAL;
use crate::state::{AddressAllocator, Line, Session, SessionId, SessionIdGenerator};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Configuration accessible to handlers via Matrix.
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    /// Server name for logs.
    pub server_name: String,
    /// Username with server administrator rights (exact match).
    pub admin_username: String,
    /// How connection addresses are assigned.
    pub address_mode: AddressMode,
    /// Per-session outbound queue capacity.
    pub outbound_queue: usize,
}

/// The Matrix - central shared state container.
pub struct Matrix {
    /// Handler-visible configuration.
    pub config: MatrixConfig,
    /// All live sessions.
    pub sessions: SessionRegistry,
    /// Rooms, membership, and each session's current room.
    pub rooms: RoomDirectory,
    /// Mutes and address bans.
    pub moderation: ModerationStore,
    /// Shutdown signalling.
    pub lifecycle: LifecycleManager,
    ids: SessionIdGenerator,
    addresses: AddressAllocator,
}

impl Matrix {
    pub fn new(config: &Config, address_mode: AddressMode) -> Self {
        Self {
            config: MatrixConfig {
                server_name: config.server.name.clone(),
                admin_username: config.server.admin_username.clone(),
                address_mode,
                outbound_queue: config.limits.outbound_queue.max(1),
            },
            sessions: SessionRegistry::new(),
            rooms: RoomDirectory::new(),
            moderation: ModerationStore::new(config.limits.max_mute_seconds),
            lifecycle: LifecycleManager::new(),
            ids: SessionIdGenerator::new(),
            addresses: AddressAllocator::new(),
        }
    }

    /// Exact, case-sensitive match against the configured admin username.
    pub fn is_server_admin(&self, username: &str) -> bool {
        username == self.config.admin_username
    }

    /// Register a new session for a connection from `peer` and place it in
    /// `General`.
    ///
    /// Other `General` members are told about the arrival. The returned guard
    /// performs disconnect cleanup when dropped.
    pub fn connect(self: &Arc<Self>, peer: IpAddr) -> (SessionGuard, mpsc::Receiver<Line>) {
        let (id, username) = self.ids.next();
        let addr = match self.config.address_mode {
            AddressMode::Peer => peer,
            AddressMode::Simulated => self.addresses.next(),
        };
        let (tx, rx) = mpsc::channel(self.config.outbound_queue);
        let session = Arc::new(Session::new(id, username, addr, tx));

        self.sessions.insert(Arc::clone(&session));
        // General always exists, so placement cannot fail.
        if let Err(e) = self.rooms.move_session(id, GENERAL) {
            debug!(session = %id, error = %e, "Failed to place session");
        }
        self.broadcast_to_room(
            GENERAL,
            &format!("[{} joined the room]", session.username()),
            Some(id),
        );
        info!(
            server = %self.config.server_name,
            session = %id,
            username = %session.username(),
            addr = %addr,
            "Session connected"
        );

        let guard = SessionGuard {
            matrix: Arc::clone(self),
            session,
        };
        (guard, rx)
    }

    /// Remove a session from its room and the registry, telling the room.
    ///
    /// Idempotent: only the first call for a given id has any effect.
    pub fn disconnect(&self, id: SessionId) -> Option<String> {
        let room = self.rooms.remove_session(id)?;
        let session = self.sessions.remove(id);
        if let Some(session) = &session {
            let username = session.username();
            self.broadcast_to_room(&room, &format!("[{username} left the room]"), None);
            info!(session = %id, username = %username, room = %room, "Session disconnected");
        }
        Some(room)
    }

    /// The room a session is currently in. Defaults to `General` for ids the
    /// directory no longer knows.
    pub fn room_of(&self, id: SessionId) -> String {
        self.rooms.room_of(id).unwrap_or_else(|| GENERAL.to_string())
    }

    /// Live sessions in `room`, in member order.
    pub fn room_sessions(&self, room: &str) -> Vec<Arc<Session>> {
        self.rooms
            .members(room)
            .into_iter()
            .filter_map(|id| self.sessions.get(id))
            .collect()
    }

    /// First member of `room` whose username matches `name` (case-insensitive).
    pub fn find_in_room(&self, room: &str, name: &str) -> Option<Arc<Session>> {
        self.room_sessions(room).into_iter().find(|s| s.is_named(name))
    }

    /// Deliver `line` to every member of `room` except `exclude`.
    ///
    /// Membership is snapshotted first, then each delivery is a non-blocking
    /// enqueue; a full or closed queue loses only that delivery. Returns the
    /// number of sessions that accepted the line.
    pub fn broadcast_to_room(&self, room: &str, line: &str, exclude: Option<SessionId>) -> usize {
        let line: Line = Arc::from(line);
        self.room_sessions(room)
            .into_iter()
            .filter(|s| Some(s.id()) != exclude)
            .filter(|s| s.deliver(Arc::clone(&line)))
            .count()
    }
}

/// Owns a connected session; dropping it runs disconnect cleanup exactly once.
pub struct SessionGuard {
    matrix: Arc<Matrix>,
    session: Arc<Session>,
}

impl SessionGuard {
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.matrix.disconnect(self.session.id());
    }
}
