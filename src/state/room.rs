//! Room records.

use super::{SessionId, username_key};
use std::collections::{BTreeSet, HashSet};

/// Name of the default room every session starts in.
pub const GENERAL: &str = "General";

/// A chat room.
///
/// Member sets are ordered by session id, which is also connection order.
#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,
    pub members: BTreeSet<SessionId>,
    /// `None` means the room is open.
    pub password: Option<String>,
    /// Username that created the room. `General` has none.
    pub creator: Option<String>,
    /// Explicit room admins (case-folded usernames).
    pub admins: HashSet<String>,
}

impl Room {
    /// The permanent default room: no creator, no admins, never protected.
    pub fn general() -> Self {
        Self {
            name: GENERAL.to_string(),
            members: BTreeSet::new(),
            password: None,
            creator: None,
            admins: HashSet::new(),
        }
    }

    /// A freshly created room. The creator starts in the admin set.
    pub fn created_by(name: &str, creator: &str) -> Self {
        let mut admins = HashSet::new();
        admins.insert(username_key(creator));
        Self {
            name: name.to_string(),
            members: BTreeSet::new(),
            password: None,
            creator: Some(creator.to_string()),
            admins,
        }
    }

    pub fn is_general(&self) -> bool {
        self.name == GENERAL
    }

    pub fn is_protected(&self) -> bool {
        self.password.is_some()
    }

    pub fn is_creator(&self, username: &str) -> bool {
        self.creator
            .as_deref()
            .is_some_and(|c| username_key(c) == username_key(username))
    }

    /// Room-admin check. The creator's authority is independent of the
    /// explicit admin set and survives a revoke.
    pub fn is_admin(&self, username: &str) -> bool {
        self.is_creator(username) || self.admins.contains(&username_key(username))
    }
}
