//! Command handlers.
//!
//! Every client line goes through [`Registry::dispatch`]: blank lines are
//! ignored, lines starting with `/` are commands, everything else is chat.

pub mod admin;
pub mod core;
mod helpers;
pub mod messaging;
pub mod moderation;
pub mod room;
pub mod user;

pub use self::core::{Args, Context, Handler, Input, Registry};

#[cfg(test)]
mod tests;
