//! Room chat and private messages.

use super::core::{Args, Context, Handler};
use crate::error::{HandlerError, HandlerResult, RoomError};
use async_trait::async_trait;
use tracing::{info, warn};

/// Plain chat: broadcast to the sender's room unless the sender is muted.
pub async fn chat(ctx: &Context<'_>, text: &str) -> HandlerResult {
    let username = ctx.username();
    let room = ctx.room();

    if ctx.matrix.moderation.is_muted(&username) {
        warn!(username = %username, room = %room, "Muted user tried to chat");
        return Err(HandlerError::Invalid(
            "You are muted and cannot send messages.".into(),
        ));
    }

    let line = format!("{}: {text}", ctx.session.display_name());
    let delivered = ctx
        .matrix
        .broadcast_to_room(&room, &line, Some(ctx.session.id()));
    info!(username = %username, room = %room, delivered, text = %text, "Chat");
    Ok(())
}

/// `/msg <username> <message>`: private message to any connected user.
pub struct MsgHandler;

#[async_trait]
impl Handler for MsgHandler {
    fn arity(&self) -> usize {
        2
    }

    fn trailing(&self) -> bool {
        true
    }

    fn usage(&self) -> &'static str {
        "/msg <username> <message>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let target = args.require(0, self.usage())?;
        let text = args.require(1, self.usage())?;

        if ctx.session.is_named(target) {
            return Err(HandlerError::Invalid(
                "You cannot send a private message to yourself.".into(),
            ));
        }
        let recipient = ctx
            .matrix
            .sessions
            .find_by_username(target)
            .ok_or_else(|| RoomError::UserNotFound(target.to_string()))?;

        recipient.deliver(format!("[Private] {}: {text}", ctx.session.display_name()).into());
        info!(from = %ctx.username(), to = %recipient.username(), "Private message");
        ctx.reply(format!("[Private] To {target}: {text}")).await
    }
}
