//! Shared handler helpers.

use crate::error::{HandlerError, RoomError};
use crate::state::{Matrix, SessionId};

/// Turn a directory `NotAuthorized` into the per-command rejection.
pub fn authorize(cmd: &'static str) -> impl Fn(RoomError) -> HandlerError {
    move |e| match e {
        RoomError::NotAuthorized => HandlerError::NotAuthorized(cmd),
        other => other.into(),
    }
}

/// Current usernames for a member snapshot, skipping sessions already gone.
pub fn usernames(matrix: &Matrix, ids: &[SessionId]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| matrix.sessions.get(*id))
        .map(|s| s.username())
        .collect()
}

/// Prefix each name with `- ` for listings.
pub fn bullet_list(names: impl IntoIterator<Item = String>) -> impl Iterator<Item = String> {
    names.into_iter().map(|n| format!("- {n}"))
}
