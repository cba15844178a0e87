//! Room moderation: `/kick`, `/ban`, `/unban`, `/mute`, `/muted`, `/unmute`.
//!
//! Authorization is room admin (explicit or creator) or server admin, checked
//! against current state on every call. The room's creator can never be
//! kicked or banned from it, whoever asks.

use super::core::{Args, Context, Handler};
use super::room::reject_in_general;
use crate::error::{HandlerError, HandlerResult, RoomError};
use crate::state::{GENERAL, Session};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::info;

/// Resolve a kick/ban target in `room` and apply the self and creator rules.
fn removable_target(
    ctx: &Context<'_>,
    room: &str,
    name: &str,
    action: &str,
) -> Result<Arc<Session>, HandlerError> {
    let target = ctx.target_in_room(room, name)?;
    if target.id() == ctx.session.id() {
        return Err(HandlerError::Invalid(format!("You cannot {action} yourself.")));
    }
    if ctx.matrix.rooms.is_creator(room, &target.username()) {
        return Err(HandlerError::Invalid(format!(
            "You cannot {action} the creator of the room."
        )));
    }
    Ok(target)
}

fn parse_seconds(raw: &str) -> Result<u64, HandlerError> {
    raw.trim().parse().map_err(|_| {
        HandlerError::Invalid("Invalid time. Must be a number in seconds (max 600).".into())
    })
}

/// `/kick <username>`: send a member of the current room back to `General`.
pub struct KickHandler;

#[async_trait]
impl Handler for KickHandler {
    fn arity(&self) -> usize {
        1
    }

    fn usage(&self) -> &'static str {
        "/kick <username>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let name = args.require(0, self.usage())?;
        let room = ctx.room();
        ctx.require_moderator(&room, "kick")?;
        reject_in_general(&room, "kick")?;

        let target = removable_target(ctx, &room, name, "kick")?;
        let target_name = target.username();
        ctx.matrix
            .rooms
            .move_from(target.id(), &room, GENERAL)
            .map_err(|_| RoomError::UserNotInRoom {
                user: name.to_string(),
                room: room.clone(),
            })?;

        target.deliver(format!("You were kicked from room '{room}'. Returned to General.").into());
        ctx.matrix.broadcast_to_room(
            &room,
            &format!("User {target_name} was kicked from the room."),
            None,
        );
        info!(by = %ctx.username(), target = %target_name, room = %room, "User kicked");
        Ok(())
    }
}

/// `/ban <username>`: bar the target's address from the current room and move
/// them to `General`.
///
/// In `General` itself the ban is recorded and the target stays put; it then
/// bars `/join General` from that address.
pub struct BanHandler;

#[async_trait]
impl Handler for BanHandler {
    fn arity(&self) -> usize {
        1
    }

    fn usage(&self) -> &'static str {
        "/ban <username>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let name = args.require(0, self.usage())?;
        let room = ctx.room();
        ctx.require_moderator(&room, "ban")?;

        let target = removable_target(ctx, &room, name, "ban")?;
        let target_name = target.username();

        // Ban first so the target cannot slip back in between the two steps.
        ctx.matrix.moderation.ban(&room, target.addr());
        target.deliver(format!("You have been banned from room: {room}").into());

        let notice = if room == GENERAL {
            format!("[{target_name} was banned from the room]")
        } else {
            // The target may have left on its own already; the ban still stands.
            if ctx.matrix.rooms.move_from(target.id(), &room, GENERAL).is_ok() {
                target.deliver("You were moved to the General room.".into());
            }
            format!("[{target_name} was banned and removed from the room]")
        };
        ctx.matrix.broadcast_to_room(&room, &notice, None);
        info!(
            by = %ctx.username(),
            target = %target_name,
            addr = %target.addr(),
            room = %room,
            "User banned"
        );
        Ok(())
    }
}

/// `/unban <username|address>`: lift an address ban on the current room.
///
/// A username resolves to that session's address; anything that parses as an
/// IP address is used directly, so disconnected users can still be unbanned.
pub struct UnbanHandler;

#[async_trait]
impl Handler for UnbanHandler {
    fn arity(&self) -> usize {
        1
    }

    fn usage(&self) -> &'static str {
        "/unban <username|address>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let target = args.require(0, self.usage())?.trim();
        let room = ctx.room();
        ctx.require_moderator(&room, "unban")?;

        let addr = match target.parse::<IpAddr>() {
            Ok(addr) => addr,
            Err(_) => ctx
                .matrix
                .sessions
                .find_by_username(target)
                .map(|s| s.addr())
                .ok_or_else(|| RoomError::UserNotFound(target.to_string()))?,
        };

        if !ctx.matrix.moderation.unban(&room, addr) {
            return Err(RoomError::NotBanned {
                target: target.to_string(),
                room,
            }
            .into());
        }
        info!(by = %ctx.username(), target = %target, addr = %addr, room = %room, "Ban lifted");
        ctx.reply(format!("Unbanned {target} from room {room}.")).await
    }
}

/// `/mute <username|all> <seconds>`: silence chat for up to the mute ceiling.
pub struct MuteHandler;

#[async_trait]
impl Handler for MuteHandler {
    fn arity(&self) -> usize {
        2
    }

    fn usage(&self) -> &'static str {
        "/mute <username|all> <seconds (max 600)>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let target = args.require(0, self.usage())?;
        let raw = args.require(1, self.usage())?;
        let room = ctx.room();
        ctx.require_moderator(&room, "mute")?;
        let requested = parse_seconds(raw)?;
        let moderation = &ctx.matrix.moderation;

        if target.eq_ignore_ascii_case("all") {
            let targets: Vec<_> = ctx
                .matrix
                .room_sessions(&room)
                .into_iter()
                .filter(|s| s.id() != ctx.session.id())
                .collect();
            let names: Vec<String> = targets.iter().map(|s| s.username()).collect();
            let applied = moderation
                .mute_all(names.iter().map(String::as_str), requested)
                .as_secs();
            for s in &targets {
                s.deliver(format!("You have been muted for {applied} seconds.").into());
            }
            info!(by = %ctx.username(), room = %room, count = targets.len(), seconds = applied, "Room muted");
            return ctx
                .reply(format!(
                    "All users (except you) have been muted for {applied} seconds."
                ))
                .await;
        }

        let session = ctx.target_in_room(&room, target)?;
        let applied = moderation.mute(&session.username(), requested).as_secs();
        session.deliver(format!("You have been muted for {applied} seconds.").into());
        info!(by = %ctx.username(), target = %session.username(), room = %room, seconds = applied, "User muted");
        ctx.reply(format!("Muted {target} for {applied} seconds."))
            .await
    }
}

/// `/unmute <username|all>`: lift mutes early.
pub struct UnmuteHandler;

#[async_trait]
impl Handler for UnmuteHandler {
    fn arity(&self) -> usize {
        1
    }

    fn usage(&self) -> &'static str {
        "/unmute <username|all>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let target = args.require(0, self.usage())?;
        let room = ctx.room();
        ctx.require_moderator(&room, "unmute")?;
        let moderation = &ctx.matrix.moderation;

        if target.eq_ignore_ascii_case("all") {
            let names: Vec<String> = ctx
                .matrix
                .room_sessions(&room)
                .iter()
                .map(|s| s.username())
                .collect();
            let lifted = moderation.unmute_all(names.iter().map(String::as_str));
            info!(by = %ctx.username(), room = %room, lifted, "Room unmuted");
            return ctx
                .reply("All users in this room have been unmuted.")
                .await;
        }

        moderation.unmute(target)?;
        if let Some(session) = ctx.matrix.find_in_room(&room, target) {
            session.deliver("You have been unmuted.".into());
        }
        info!(by = %ctx.username(), target = %target, room = %room, "User unmuted");
        ctx.reply(format!("Unmuted {target}")).await
    }
}

/// `/muted`: list active mutes among the current room's members.
pub struct MutedHandler;

#[async_trait]
impl Handler for MutedHandler {
    fn arity(&self) -> usize {
        0
    }

    fn usage(&self) -> &'static str {
        "/muted"
    }

    async fn handle(&self, ctx: &mut Context<'_>, _args: &Args<'_>) -> HandlerResult {
        let room = ctx.room();
        let muted: Vec<String> = ctx
            .matrix
            .room_sessions(&room)
            .iter()
            .filter_map(|s| {
                let name = s.username();
                ctx.matrix
                    .moderation
                    .remaining(&name)
                    .map(|left| format!("- {name} ({}s remaining)", left.as_secs()))
            })
            .collect();

        if muted.is_empty() {
            return ctx.reply("No users are currently muted in this room.").await;
        }
        let mut lines = vec!["Muted users in this room:".to_string()];
        lines.extend(muted);
        ctx.reply_lines(lines).await
    }
}
