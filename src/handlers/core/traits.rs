//! The handler trait implemented by every slash command.

use super::context::Context;
use super::line::Args;
use crate::error::HandlerResult;
use async_trait::async_trait;

/// A slash-command handler.
///
/// Handlers receive already-split arguments and return an error for anything
/// the caller should be told about; the registry renders it.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Number of positional arguments.
    fn arity(&self) -> usize;

    /// Whether the last argument takes the rest of the line (free text such
    /// as a message or password). Otherwise every argument is one token.
    fn trailing(&self) -> bool {
        false
    }

    /// One-line usage shown by `/help` and on malformed input.
    fn usage(&self) -> &'static str;

    /// Handle one invocation.
    async fn handle(&self, ctx: &mut Context<'_>, args: &Args<'_>) -> HandlerResult;
}
