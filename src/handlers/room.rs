//! Room navigation: `/join`, `/exit`, `/room`, `/users`, `/password`.

use super::core::{Args, Context, Handler};
use super::helpers::{authorize, bullet_list, usernames};
use crate::error::{HandlerError, HandlerResult};
use crate::state::GENERAL;
use crate::state::managers::room::{JoinRequest, PasswordChange, RoomListing};
use async_trait::async_trait;
use tracing::{info, warn};

/// `/join <roomName> [password]`: switch rooms, creating the room on first use.
pub struct JoinHandler;

#[async_trait]
impl Handler for JoinHandler {
    fn arity(&self) -> usize {
        2
    }

    fn trailing(&self) -> bool {
        true
    }

    fn usage(&self) -> &'static str {
        "/join <roomName> [password]"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let room = args.require(0, self.usage())?.trim();
        if room.is_empty() {
            return Err(HandlerError::Invalid("Room name cannot be empty.".into()));
        }
        let username = ctx.username();
        let matrix = ctx.matrix;

        let request = JoinRequest {
            session: ctx.session.id(),
            username: &username,
            addr: ctx.session.addr(),
            room,
            password: args.get(1),
        };
        let outcome = match matrix.rooms.join(request, &matrix.moderation) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    username = %username,
                    addr = %ctx.session.addr(),
                    room = %room,
                    error = e.error_code(),
                    "Join rejected"
                );
                return Err(e.into());
            }
        };

        if let Some(previous) = outcome.previous.as_deref()
            && previous != room
        {
            matrix.broadcast_to_room(previous, &format!("[{username} left the room]"), None);
        }
        matrix.broadcast_to_room(
            room,
            &format!("[{username} joined the room]"),
            Some(ctx.session.id()),
        );
        info!(username = %username, from = ?outcome.previous, room = %room, "Joined room");

        let confirmation = match (outcome.created, outcome.password_set) {
            (true, true) => format!("Room '{room}' created with a password."),
            (true, false) => format!("Room '{room}' created."),
            (false, _) => format!("Joined room: {room}"),
        };
        ctx.reply(confirmation).await
    }
}

/// `/exit`: return to `General`.
pub struct ExitHandler;

#[async_trait]
impl Handler for ExitHandler {
    fn arity(&self) -> usize {
        0
    }

    fn usage(&self) -> &'static str {
        "/exit"
    }

    async fn handle(&self, ctx: &mut Context<'_>, _args: &Args<'_>) -> HandlerResult {
        let id = ctx.session.id();
        let username = ctx.username();
        if ctx.room() == GENERAL {
            return ctx.reply("You're already in the General room.").await;
        }

        let previous = ctx.matrix.rooms.move_session(id, GENERAL)?;
        if let Some(previous) = previous.as_deref()
            && previous != GENERAL
        {
            ctx.matrix
                .broadcast_to_room(previous, &format!("[{username} left the room]"), None);
        }
        ctx.matrix
            .broadcast_to_room(GENERAL, &format!("[{username} returned to General]"), Some(id));
        info!(username = %username, from = ?previous, "Returned to General");
        ctx.reply("You have returned to the General room.").await
    }
}

/// `/room`: report the current room.
pub struct RoomHandler;

#[async_trait]
impl Handler for RoomHandler {
    fn arity(&self) -> usize {
        0
    }

    fn usage(&self) -> &'static str {
        "/room"
    }

    async fn handle(&self, ctx: &mut Context<'_>, _args: &Args<'_>) -> HandlerResult {
        ctx.reply(format!("You are currently in room: {}", ctx.room()))
            .await
    }
}

/// `/users`: members of the current room, or of every room from `General`.
pub struct UsersHandler;

#[async_trait]
impl Handler for UsersHandler {
    fn arity(&self) -> usize {
        0
    }

    fn usage(&self) -> &'static str {
        "/users"
    }

    async fn handle(&self, ctx: &mut Context<'_>, _args: &Args<'_>) -> HandlerResult {
        let room = ctx.room();
        let listing = ctx.matrix.rooms.listing(&room)?;

        let mut lines = Vec::new();
        match listing {
            RoomListing::All(rooms) => {
                lines.push("All users by room:".to_string());
                for summary in rooms {
                    if summary.protected {
                        lines.push(format!("[{}] (Password protected):", summary.name));
                    } else {
                        lines.push(format!("[{}]:", summary.name));
                    }
                    lines.extend(bullet_list(usernames(ctx.matrix, &summary.members)));
                }
            }
            RoomListing::Single(summary) => {
                lines.push(format!("Users in room '{}':", summary.name));
                lines.extend(bullet_list(usernames(ctx.matrix, &summary.members)));
            }
        }
        ctx.reply_lines(lines).await
    }
}

/// `/password <newPassword>`: set or (with a blank argument) clear the
/// current room's password.
pub struct PasswordHandler;

#[async_trait]
impl Handler for PasswordHandler {
    fn arity(&self) -> usize {
        1
    }

    fn trailing(&self) -> bool {
        true
    }

    fn usage(&self) -> &'static str {
        "/password <newPassword>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let password = args.require(0, self.usage())?;
        let room = ctx.room();
        let username = ctx.username();

        let change = ctx
            .matrix
            .rooms
            .set_password(&room, password, &username, ctx.is_server_admin())
            .map_err(authorize("password"))?;

        info!(username = %username, room = %room, change = ?change, "Room password changed");
        let reply = match change {
            PasswordChange::Set => format!("Password set for room: {room}"),
            PasswordChange::Cleared => format!("Password removed for room: {room}"),
        };
        ctx.reply(reply).await
    }
}

/// Kick has nowhere to send a target who is already in `General`.
pub(super) fn reject_in_general(room: &str, action: &str) -> Result<(), HandlerError> {
    if room == GENERAL {
        Err(HandlerError::Invalid(format!(
            "You cannot {action} users from the General room."
        )))
    } else {
        Ok(())
    }
}
