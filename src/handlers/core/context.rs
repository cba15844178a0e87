//! Command handler context.
//!
//! Defines the `Context<'a>` struct passed to all handlers.

use super::registry::Registry;
use crate::error::{HandlerError, RoomError};
use crate::state::{Line, Matrix, Session};
use std::sync::Arc;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// Shared server state.
    pub matrix: &'a Arc<Matrix>,
    /// The invoking session.
    pub session: &'a Arc<Session>,
    /// Command registry (for `/help`).
    pub registry: &'a Registry,
}

impl<'a> Context<'a> {
    pub fn new(matrix: &'a Arc<Matrix>, session: &'a Arc<Session>, registry: &'a Registry) -> Self {
        Self {
            matrix,
            session,
            registry,
        }
    }

    /// Send one line back to the invoking client.
    #[inline]
    pub async fn reply(&self, line: impl Into<Line>) -> Result<(), HandlerError> {
        self.session.send(line).await?;
        Ok(())
    }

    /// Send several lines back, in order.
    pub async fn reply_lines(&self, lines: Vec<String>) -> Result<(), HandlerError> {
        for line in lines {
            self.session.send(line).await?;
        }
        Ok(())
    }

    pub fn username(&self) -> String {
        self.session.username()
    }

    /// The caller's current room, read fresh from the directory.
    pub fn room(&self) -> String {
        self.matrix.room_of(self.session.id())
    }

    pub fn is_server_admin(&self) -> bool {
        self.matrix.is_server_admin(&self.session.username())
    }

    /// Room admin (explicit or creator) of `room`, or server admin.
    pub fn can_moderate(&self, room: &str) -> bool {
        self.is_server_admin() || self.matrix.rooms.is_room_admin(room, &self.username())
    }

    /// Fail with `NotAuthorized(cmd)` unless the caller can moderate `room`.
    pub fn require_moderator(&self, room: &str, cmd: &'static str) -> Result<(), HandlerError> {
        if self.can_moderate(room) {
            Ok(())
        } else {
            Err(HandlerError::NotAuthorized(cmd))
        }
    }

    /// Fail with `AdminOnly(cmd)` unless the caller is the server admin.
    pub fn require_server_admin(&self, cmd: &'static str) -> Result<(), HandlerError> {
        if self.is_server_admin() {
            Ok(())
        } else {
            Err(HandlerError::AdminOnly(cmd))
        }
    }

    /// Member of `room` named `name`, or `UserNotInRoom`.
    pub fn target_in_room(&self, room: &str, name: &str) -> Result<Arc<Session>, HandlerError> {
        self.matrix.find_in_room(room, name).ok_or_else(|| {
            RoomError::UserNotInRoom {
                user: name.to_string(),
                room: room.to_string(),
            }
            .into()
        })
    }
}
