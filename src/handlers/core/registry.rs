//! Command handler registry and dispatch.
//!
//! The `Registry` maps slash-command names to handlers, tracks per-command
//! usage counts, and is the single place where handler errors are logged and
//! rendered back to the client.

use super::context::Context;
use super::line::{Args, Input};
use super::traits::Handler;
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{
    admin::{GrantHandler, RevokeHandler, ShutdownHandler},
    messaging::{MsgHandler, chat},
    moderation::{BanHandler, KickHandler, MuteHandler, MutedHandler, UnbanHandler, UnmuteHandler},
    room::{ExitHandler, JoinHandler, PasswordHandler, RoomHandler, UsersHandler},
    user::{ColorHandler, HelpHandler, UsernameHandler},
};
use crate::state::{Matrix, Session};
use crate::telemetry::spans;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Instrument, debug, trace, warn};

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
    /// Command usage counters.
    command_counts: HashMap<&'static str, AtomicU64>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Identity
        handlers.insert("username", Box::new(UsernameHandler));
        handlers.insert("color", Box::new(ColorHandler));
        handlers.insert("help", Box::new(HelpHandler));

        // Rooms
        handlers.insert("join", Box::new(JoinHandler));
        handlers.insert("exit", Box::new(ExitHandler));
        handlers.insert("room", Box::new(RoomHandler));
        handlers.insert("users", Box::new(UsersHandler));
        handlers.insert("password", Box::new(PasswordHandler));

        // Messaging
        handlers.insert("msg", Box::new(MsgHandler));

        // Moderation
        handlers.insert("kick", Box::new(KickHandler));
        handlers.insert("ban", Box::new(BanHandler));
        handlers.insert("unban", Box::new(UnbanHandler));
        handlers.insert("mute", Box::new(MuteHandler));
        handlers.insert("muted", Box::new(MutedHandler));
        handlers.insert("unmute", Box::new(UnmuteHandler));

        // Administration
        handlers.insert("grant", Box::new(GrantHandler));
        handlers.insert("revoke", Box::new(RevokeHandler));
        handlers.insert("shutdown", Box::new(ShutdownHandler));

        let command_counts = handlers
            .keys()
            .map(|&cmd| (cmd, AtomicU64::new(0)))
            .collect();

        Self {
            handlers,
            command_counts,
        }
    }

    /// Usage lines for every registered command, sorted by name.
    pub fn usages(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
            .into_iter()
            .filter_map(|n| self.handlers.get(n).map(|h| h.usage()))
            .collect()
    }

    /// Command usage statistics, most used first. Unused commands are omitted.
    pub fn command_stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .command_counts
            .iter()
            .map(|(cmd, count)| (*cmd, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        stats
    }

    /// Process one inbound line from `session`.
    ///
    /// User-facing failures are logged and replied to here. Only a failure to
    /// reach the invoking client itself is returned.
    pub async fn dispatch(&self, matrix: &Arc<Matrix>, session: &Arc<Session>, line: &str) -> HandlerResult {
        let mut ctx = Context::new(matrix, session, self);
        let room = ctx.room();
        let username = session.username();

        let (label, result) = match Input::parse(line) {
            Input::Empty => return Ok(()),
            Input::Chat(text) => {
                let span = spans::command("chat", &username, &room);
                ("chat".to_string(), chat(&ctx, text).instrument(span).await)
            }
            Input::Command { name, rest } => {
                let span = spans::command(name, &username, &room);
                let result = self.run(&mut ctx, name, rest).instrument(span).await;
                (name.to_string(), result)
            }
        };

        match result {
            Ok(()) => Ok(()),
            Err(e @ HandlerError::Send(_)) => Err(e),
            Err(e) => {
                if e.is_authorization_failure() {
                    warn!(
                        command = %label,
                        username = %username,
                        room = %room,
                        error = e.error_code(),
                        "Unauthorized command"
                    );
                } else if e.is_informational() {
                    trace!(command = %label, outcome = e.error_code(), "Command outcome");
                } else {
                    debug!(command = %label, error = %e, "Command error");
                }
                match e.to_reply() {
                    Some(reply) => ctx.reply(reply).await,
                    None => Ok(()),
                }
            }
        }
    }

    async fn run(&self, ctx: &mut Context<'_>, name: &str, rest: &str) -> HandlerResult {
        let Some(handler) = self.handlers.get(name) else {
            return Err(HandlerError::UnknownCommand(name.to_string()));
        };
        if let Some(counter) = self.command_counts.get(name) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        let args = Args::split(rest, handler.arity(), handler.trailing());
        handler.handle(ctx, &args).await
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
