//! Unified error handling for roomchat.
//!
//! Two layers: [`RoomError`] describes outcomes of room directory and
//! moderation store operations, and [`HandlerError`] is what command handlers
//! return to the dispatcher. Both render to the single text line sent back to
//! the invoking client.

use crate::state::Line;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError;

// ============================================================================
// Room Errors (directory and moderation operations)
// ============================================================================

/// Outcome of a rejected room or moderation operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("banned from room {0}")]
    Banned(String),

    #[error("incorrect password for room {0}")]
    IncorrectPassword(String),

    #[error("not authorized")]
    NotAuthorized,

    #[error("no such room: {0}")]
    NoSuchRoom(String),

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("user {user} is not in room {room}")]
    UserNotInRoom { user: String, room: String },

    #[error("user {0} is not a room admin")]
    NotAdmin(String),

    #[error("user {0} is not muted")]
    NotMuted(String),

    #[error("{target} is not banned from room {room}")]
    NotBanned { target: String, room: String },

    #[error("General cannot be password protected")]
    GeneralIsOpen,
}

impl RoomError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Banned(_) => "banned",
            Self::IncorrectPassword(_) => "incorrect_password",
            Self::NotAuthorized => "not_authorized",
            Self::NoSuchRoom(_) => "no_such_room",
            Self::UserNotFound(_) => "user_not_found",
            Self::UserNotInRoom { .. } => "user_not_in_room",
            Self::NotAdmin(_) => "not_admin",
            Self::NotMuted(_) => "not_muted",
            Self::NotBanned { .. } => "not_banned",
            Self::GeneralIsOpen => "general_is_open",
        }
    }

    /// Whether this outcome is informational rather than a rejection.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::NotMuted(_) | Self::NotBanned { .. } | Self::NotAdmin(_)
        )
    }

    /// The line shown to the client.
    pub fn to_reply(&self) -> String {
        match self {
            Self::Banned(room) => format!("You are banned from room: {room}"),
            Self::IncorrectPassword(room) => format!("Incorrect password for room: {room}"),
            Self::NotAuthorized => "You are not authorized to do that.".to_string(),
            Self::NoSuchRoom(room) => format!("Room '{room}' not found."),
            Self::UserNotFound(user) => format!("User {user} not found on the server."),
            Self::UserNotInRoom { user, room } => {
                format!("User '{user}' not found in room '{room}'.")
            }
            Self::NotAdmin(user) => format!("User {user} is not a room admin."),
            Self::NotMuted(user) => format!("User {user} is not currently muted."),
            Self::NotBanned { target, room } => {
                format!("{target} is not currently banned from room {room}.")
            }
            Self::GeneralIsOpen => "The General room cannot be password protected.".to_string(),
        }
    }
}

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed or missing arguments; carries the usage string.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Argument present but unacceptable (bad number, bad color, ...).
    #[error("invalid argument: {0}")]
    Invalid(String),

    /// Caller lacks room-admin or server-admin rights for the command.
    #[error("not authorized for /{0}")]
    NotAuthorized(&'static str),

    /// Command is reserved for the server administrator.
    #[error("server admin only: /{0}")]
    AdminOnly(&'static str),

    #[error("unknown command: /{0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("send error: {0}")]
    Send(#[from] SendError<Line>),
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::Invalid(_) => "invalid_argument",
            Self::NotAuthorized(_) => "not_authorized",
            Self::AdminOnly(_) => "admin_only",
            Self::UnknownCommand(_) => "unknown_command",
            Self::Room(e) => e.error_code(),
            Self::Send(_) => "send_error",
        }
    }

    /// Authorization failures are logged as warnings.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            Self::NotAuthorized(_) | Self::AdminOnly(_) | Self::Room(RoomError::NotAuthorized)
        )
    }

    /// Outcomes such as "not muted" that are reported but are not failures.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::Room(e) if e.is_informational())
    }

    /// Convert to the reply line for the invoking client.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply.
    pub fn to_reply(&self) -> Option<String> {
        let line = match self {
            Self::Usage(usage) => format!("Usage: {usage}"),
            Self::Invalid(reason) => reason.clone(),
            Self::NotAuthorized(cmd) => format!("You are not authorized to use /{cmd}."),
            Self::AdminOnly(cmd) => format!("Only the server admin can use /{cmd}."),
            Self::UnknownCommand(cmd) => format!("Unknown command: /{cmd}"),
            Self::Room(e) => e.to_reply(),
            Self::Send(_) => return None,
        };
        Some(line)
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
