//! Inbound line classification and argument splitting.

use crate::error::HandlerError;

/// What a client line asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// Blank line; ignored.
    Empty,
    /// Plain chat text for the current room.
    Chat(&'a str),
    /// `/name rest...`
    Command { name: &'a str, rest: &'a str },
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        if line.trim().is_empty() {
            return Self::Empty;
        }
        match line.strip_prefix('/') {
            Some(body) => {
                let (name, rest) = body.split_once(' ').unwrap_or((body, ""));
                Self::Command { name, rest }
            }
            None => Self::Chat(line),
        }
    }
}

/// Positional command arguments.
///
/// The remainder after the command name is split on single spaces. Each
/// argument is one token and extra tokens are ignored, except that a
/// `trailing` command's last argument keeps the rest of the line, spaces
/// included. Empty parts count as missing, whitespace-only parts do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args<'a> {
    parts: Vec<&'a str>,
}

impl<'a> Args<'a> {
    pub fn split(rest: &'a str, arity: usize, trailing: bool) -> Self {
        let parts = if arity == 0 || rest.is_empty() {
            Vec::new()
        } else if trailing {
            rest.splitn(arity, ' ').collect()
        } else {
            rest.split(' ').take(arity).collect()
        };
        Self { parts }
    }

    /// Argument `i`, or `None` if absent or empty.
    pub fn get(&self, i: usize) -> Option<&'a str> {
        self.parts.get(i).copied().filter(|p| !p.is_empty())
    }

    /// Argument `i`, or a usage error.
    pub fn require(&self, i: usize, usage: &'static str) -> Result<&'a str, HandlerError> {
        self.get(i).ok_or(HandlerError::Usage(usage))
    }
}
