//! Per-user settings and help: `/username`, `/color`, `/help`.

use super::core::{Args, Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::Color;
use async_trait::async_trait;
use tracing::info;

/// `/username <newName>`: rename the caller. Names are not required to be unique.
pub struct UsernameHandler;

#[async_trait]
impl Handler for UsernameHandler {
    fn arity(&self) -> usize {
        1
    }

    fn trailing(&self) -> bool {
        true
    }

    fn usage(&self) -> &'static str {
        "/username <newName>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let name = args.require(0, self.usage())?.trim();
        if name.is_empty() {
            return Err(HandlerError::Invalid("Username cannot be empty.".into()));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(HandlerError::Invalid(
                "Username cannot contain spaces.".into(),
            ));
        }

        let old = ctx.session.set_username(name.to_string());
        info!(session = %ctx.session.id(), old = %old, new = %name, "Username changed");
        ctx.reply(format!("Username changed to {name}")).await
    }
}

/// `/color <colorName>`: change the caller's display color.
pub struct ColorHandler;

#[async_trait]
impl Handler for ColorHandler {
    fn arity(&self) -> usize {
        1
    }

    fn usage(&self) -> &'static str {
        "/color <colorName>"
    }

    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult {
        let name = args.require(0, self.usage())?;
        let color: Color = name.parse().map_err(|_| {
            HandlerError::Invalid(format!("Unsupported color. Available: {}", Color::available()))
        })?;
        ctx.session.set_color(color);
        ctx.reply(format!("Color changed to {color}")).await
    }
}

/// `/help`: list every command with its usage.
pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    fn arity(&self) -> usize {
        0
    }

    fn usage(&self) -> &'static str {
        "/help"
    }

    async fn handle(&self, ctx: &mut Context<'_>, _args: &Args<'_>) -> HandlerResult {
        let mut lines = vec!["Available commands:".to_string()];
        lines.extend(ctx.registry.usages().into_iter().map(|u| format!("  {u}")));
        ctx.reply_lines(lines).await
    }
}
