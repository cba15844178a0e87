//! Privilege management and server control: `/grant`, `/revoke`, `/shutdown`.

use super::core::{Args, Context, Handler};
use super::helpers::authorize;
use crate::error::HandlerResult;
use async_trait::async_trait;
use tracing::{info, warn};

/// `/grant <username>`: make a member of the current room a room admin.
pub struct GrantHandler;

#[async_trait]
impl Handler for GrantHandler {
    fn arity(&self) -> usize {
        1
    }

    fn usage(&self) -> &'static str {
        "/grant <username>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let name = args.require(0, self.usage())?;
        let room = ctx.room();
        ctx.require_moderator(&room, "grant")?;

        let target = ctx.target_in_room(&room, name)?;
        let target_name = target.username();
        ctx.matrix
            .rooms
            .grant_admin(&room, &target_name, &ctx.username(), ctx.is_server_admin())
            .map_err(authorize("grant"))?;

        target.deliver(format!("You have been granted admin rights in room: {room}").into());
        info!(by = %ctx.username(), target = %target_name, room = %room, "Room admin granted");
        ctx.reply(format!("Granted admin to {name}")).await
    }
}

/// `/revoke <username>`: remove a room admin. Server admin only.
///
/// The creator keeps implicit authority even after being revoked.
pub struct RevokeHandler;

#[async_trait]
impl Handler for RevokeHandler {
    fn arity(&self) -> usize {
        1
    }

    fn usage(&self) -> &'static str {
        "/revoke <username>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let name = args.require(0, self.usage())?;
        ctx.require_server_admin("revoke")?;
        let room = ctx.room();

        ctx.matrix
            .rooms
            .revoke_admin(&room, name, true)
            .map_err(authorize("revoke"))?;

        if let Some(target) = ctx.matrix.sessions.find_by_username(name) {
            target.deliver(format!("Your admin rights in room: {room} have been revoked.").into());
        }
        info!(by = %ctx.username(), target = %name, room = %room, "Room admin revoked");
        ctx.reply(format!("Revoked admin from {name}")).await
    }
}

/// `/shutdown`: stop the server. Server admin only.
pub struct ShutdownHandler;

#[async_trait]
impl Handler for ShutdownHandler {
    fn arity(&self) -> usize {
        0
    }

    fn usage(&self) -> &'static str {
        "/shutdown"
    }

    async fn handle(&self, ctx: &mut Context<'_>, _args: &Args<'_>) -> HandlerResult {
        ctx.require_server_admin("shutdown")?;
        ctx.reply("Server is shutting down...").await?;

        for session in ctx.matrix.sessions.all() {
            if session.id() != ctx.session.id() {
                session.deliver("Server is shutting down...".into());
            }
        }
        warn!(by = %ctx.username(), "Server shutdown initiated");
        ctx.matrix.lifecycle.shutdown(&ctx.username());
        Ok(())
    }
}
