//! Session registry.
//!
//! Holds every live [`Session`] keyed by id. Usernames are not unique:
//! [`SessionRegistry::find_by_username`] returns whichever case-insensitive
//! match the map yields first, so with duplicate names the chosen session is
//! unspecified.

use crate::state::dashmap_ext::DashMapExt;
use crate::state::{Session, SessionId};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Arc<Session>) {
        self.sessions.insert(session.id(), session);
    }

    pub fn remove(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.remove(&id).map(|(_, s)| s)
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.get_cloned(&id)
    }

    /// First session whose username matches `name` case-insensitively.
    pub fn find_by_username(&self, name: &str) -> Option<Arc<Session>> {
        self.sessions.find_cloned(|s| s.is_named(name))
    }

    /// Snapshot of all live sessions.
    pub fn all(&self) -> Vec<Arc<Session>> {
        self.sessions.values_cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
