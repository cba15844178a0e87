//! Per-connection session identity and outbound queue.
//!
//! A `Session` is owned by its connection task and shared (via `Arc`) with the
//! session registry. Its current room is *not* stored here: the room
//! directory owns the session → room pointer so that membership and pointer
//! always change together.

use super::{Color, SessionId};
use parking_lot::RwLock;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendError, TrySendError};
use tracing::debug;

/// A line queued for delivery to one client.
pub type Line = Arc<str>;

/// Mutable display attributes of a session.
#[derive(Debug, Clone)]
struct Profile {
    username: String,
    color: Color,
}

/// One live client connection.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    addr: IpAddr,
    profile: RwLock<Profile>,
    sender: mpsc::Sender<Line>,
}

impl Session {
    pub fn new(id: SessionId, username: String, addr: IpAddr, sender: mpsc::Sender<Line>) -> Self {
        Self {
            id,
            addr,
            profile: RwLock::new(Profile {
                username,
                color: Color::Reset,
            }),
            sender,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Originating network address, stable for the connection's lifetime.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn username(&self) -> String {
        self.profile.read().username.clone()
    }

    /// Replace the username, returning the previous one.
    pub fn set_username(&self, username: String) -> String {
        std::mem::replace(&mut self.profile.write().username, username)
    }

    pub fn set_color(&self, color: Color) {
        self.profile.write().color = color;
    }

    /// Case-insensitive username comparison.
    pub fn is_named(&self, name: &str) -> bool {
        super::username_key(&self.profile.read().username) == super::username_key(name)
    }

    /// Username wrapped in the session's display color.
    pub fn display_name(&self) -> String {
        let profile = self.profile.read();
        profile.color.paint(&profile.username)
    }

    /// Queue a line, waiting for room in the outbound queue.
    ///
    /// Used for replies to the session's own commands.
    pub async fn send(&self, line: impl Into<Line>) -> Result<(), SendError<Line>> {
        self.sender.send(line.into()).await
    }

    /// Best-effort delivery used by fan-out. Never blocks.
    ///
    /// Returns `false` if the line was dropped because the queue is full or
    /// the connection is gone.
    pub fn deliver(&self, line: Line) -> bool {
        match self.sender.try_send(line) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!(session = %self.id, "Outbound queue full, dropping line");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(session = %self.id, "Outbound queue closed, dropping line");
                false
            }
        }
    }
}
