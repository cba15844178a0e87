//! Room directory state and behavior.
//!
//! All room records and the session → current-room pointer live behind one
//! mutex. Every membership transition (connect placement, join, kick, ban,
//! exit, disconnect) goes through [`RoomDirectory::move_session`] or
//! [`RoomDirectory::remove_session`], so a session is in exactly one room's
//! member set, and that room is its recorded room, whenever the lock is free.
//!
//! Critical sections are short and never await.

use super::moderation::ModerationStore;
use crate::error::RoomError;
use crate::state::room::{GENERAL, Room};
use crate::state::{SessionId, username_key};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use tracing::info;

/// A request to switch a session into a room, creating it if needed.
#[derive(Debug, Clone, Copy)]
pub struct JoinRequest<'a> {
    pub session: SessionId,
    pub username: &'a str,
    pub addr: IpAddr,
    pub room: &'a str,
    pub password: Option<&'a str>,
}

/// What a successful join did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Room the session was in before (may equal the target).
    pub previous: Option<String>,
    /// Whether this join created the room.
    pub created: bool,
    /// Whether a password was set as part of creation.
    pub password_set: bool,
}

/// Result of a `/password` change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordChange {
    Set,
    Cleared,
}

/// Snapshot of one room for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub name: String,
    pub protected: bool,
    pub members: Vec<SessionId>,
}

/// Answer to `/users`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomListing {
    /// Requested from `General`: every room.
    All(Vec<RoomSummary>),
    /// Requested from any other room: that room only.
    Single(RoomSummary),
}

#[derive(Debug)]
struct Rooms {
    /// Room name (case-sensitive) -> record.
    rooms: BTreeMap<String, Room>,
    /// Session -> name of the room it is in.
    locations: HashMap<SessionId, String>,
}

impl Rooms {
    fn ensure(&mut self, name: &str, creator: &str) -> bool {
        if self.rooms.contains_key(name) {
            return false;
        }
        self.rooms
            .insert(name.to_string(), Room::created_by(name, creator));
        true
    }

    /// Leave old room, enter new room, update pointer. Caller holds the lock
    /// and has checked that `room` exists.
    fn relocate(&mut self, session: SessionId, room: &str) -> Option<String> {
        let previous = self.locations.insert(session, room.to_string());
        if let Some(old) = previous.as_deref()
            && let Some(old_room) = self.rooms.get_mut(old)
        {
            old_room.members.remove(&session);
        }
        if let Some(new_room) = self.rooms.get_mut(room) {
            new_room.members.insert(session);
        }
        previous
    }

    fn get(&self, room: &str) -> Result<&Room, RoomError> {
        self.rooms
            .get(room)
            .ok_or_else(|| RoomError::NoSuchRoom(room.to_string()))
    }

    fn get_mut(&mut self, room: &str) -> Result<&mut Room, RoomError> {
        self.rooms
            .get_mut(room)
            .ok_or_else(|| RoomError::NoSuchRoom(room.to_string()))
    }
}

/// The room directory.
pub struct RoomDirectory {
    inner: Mutex<Rooms>,
}

impl RoomDirectory {
    /// Create a directory holding only `General`.
    pub fn new() -> Self {
        let mut rooms = BTreeMap::new();
        rooms.insert(GENERAL.to_string(), Room::general());
        Self {
            inner: Mutex::new(Rooms {
                rooms,
                locations: HashMap::new(),
            }),
        }
    }

    /// Fetch or create `name`. Returns `true` if this call created it.
    ///
    /// Concurrent callers racing on the same new name see exactly one creation.
    pub fn ensure_room(&self, name: &str, creator: &str) -> bool {
        let created = self.inner.lock().ensure(name, creator);
        if created {
            info!(room = %name, creator = %creator, "Room created");
        }
        created
    }

    /// Switch a session into a room, creating the room on first use.
    ///
    /// Ban check, password check, creation, and the membership move all happen
    /// in one critical section.
    pub fn join(
        &self,
        req: JoinRequest<'_>,
        moderation: &ModerationStore,
    ) -> Result<JoinOutcome, RoomError> {
        let mut inner = self.inner.lock();

        if moderation.is_banned(req.room, req.addr) {
            return Err(RoomError::Banned(req.room.to_string()));
        }

        let created = inner.ensure(req.room, req.username);
        let mut password_set = false;
        let room = inner.get_mut(req.room)?;

        if created {
            if let Some(pw) = req.password.filter(|p| !p.trim().is_empty()) {
                room.password = Some(pw.to_string());
                password_set = true;
            }
        } else if let Some(required) = room.password.as_deref()
            && req.password != Some(required)
        {
            return Err(RoomError::IncorrectPassword(req.room.to_string()));
        }

        let previous = inner.relocate(req.session, req.room);
        drop(inner);

        if created {
            info!(
                room = %req.room,
                creator = %req.username,
                protected = password_set,
                "Room created"
            );
        }

        Ok(JoinOutcome {
            previous,
            created,
            password_set,
        })
    }

    /// Move a session into an existing room without any checks.
    ///
    /// Used for connect placement, kick, ban, and exit. Returns the previous room.
    pub fn move_session(&self, session: SessionId, room: &str) -> Result<Option<String>, RoomError> {
        let mut inner = self.inner.lock();
        inner.get(room)?;
        Ok(inner.relocate(session, room))
    }

    /// Move a session from `from` to `to`, but only if it is still in `from`.
    ///
    /// Kick and ban use this so a target that left on its own is not dragged
    /// back out of its new room.
    pub fn move_from(&self, session: SessionId, from: &str, to: &str) -> Result<(), RoomError> {
        let mut inner = self.inner.lock();
        inner.get(to)?;
        if inner.locations.get(&session).map(String::as_str) != Some(from) {
            return Err(RoomError::UserNotInRoom {
                user: session.to_string(),
                room: from.to_string(),
            });
        }
        inner.relocate(session, to);
        Ok(())
    }

    /// Drop a session from the directory. Returns the room it was in.
    pub fn remove_session(&self, session: SessionId) -> Option<String> {
        let mut inner = self.inner.lock();
        let room = inner.locations.remove(&session)?;
        if let Some(r) = inner.rooms.get_mut(&room) {
            r.members.remove(&session);
        }
        Some(room)
    }

    /// The room a session is currently in.
    pub fn room_of(&self, session: SessionId) -> Option<String> {
        self.inner.lock().locations.get(&session).cloned()
    }

    pub fn exists(&self, room: &str) -> bool {
        self.inner.lock().rooms.contains_key(room)
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().rooms.len()
    }

    /// Snapshot of a room's members (empty if the room is unknown).
    pub fn members(&self, room: &str) -> Vec<SessionId> {
        self.inner
            .lock()
            .rooms
            .get(room)
            .map(|r| r.members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, room: &str, session: SessionId) -> bool {
        self.inner
            .lock()
            .locations
            .get(&session)
            .is_some_and(|r| r == room)
    }

    pub fn creator(&self, room: &str) -> Option<String> {
        self.inner
            .lock()
            .rooms
            .get(room)
            .and_then(|r| r.creator.clone())
    }

    pub fn is_protected(&self, room: &str) -> bool {
        self.inner
            .lock()
            .rooms
            .get(room)
            .is_some_and(Room::is_protected)
    }

    /// Creator or explicit admin of `room`.
    pub fn is_room_admin(&self, room: &str, username: &str) -> bool {
        self.inner
            .lock()
            .rooms
            .get(room)
            .is_some_and(|r| r.is_admin(username))
    }

    pub fn is_creator(&self, room: &str, username: &str) -> bool {
        self.inner
            .lock()
            .rooms
            .get(room)
            .is_some_and(|r| r.is_creator(username))
    }

    /// Set (non-blank) or clear (blank) a room's password.
    pub fn set_password(
        &self,
        room: &str,
        password: &str,
        requester: &str,
        server_admin: bool,
    ) -> Result<PasswordChange, RoomError> {
        let mut inner = self.inner.lock();
        let record = inner.get_mut(room)?;
        if !(server_admin || record.is_admin(requester)) {
            return Err(RoomError::NotAuthorized);
        }
        if record.is_general() {
            return Err(RoomError::GeneralIsOpen);
        }
        if password.trim().is_empty() {
            record.password = None;
            Ok(PasswordChange::Cleared)
        } else {
            record.password = Some(password.to_string());
            Ok(PasswordChange::Set)
        }
    }

    /// Add `target` to the room's admin set. Returns `false` if already present.
    pub fn grant_admin(
        &self,
        room: &str,
        target: &str,
        requester: &str,
        server_admin: bool,
    ) -> Result<bool, RoomError> {
        let mut inner = self.inner.lock();
        let record = inner.get_mut(room)?;
        if !(server_admin || record.is_admin(requester)) {
            return Err(RoomError::NotAuthorized);
        }
        Ok(record.admins.insert(username_key(target)))
    }

    /// Remove `target` from the room's admin set. Server administrator only.
    ///
    /// Revoking the creator only clears the explicit entry; creator authority
    /// remains.
    pub fn revoke_admin(&self, room: &str, target: &str, server_admin: bool) -> Result<(), RoomError> {
        if !server_admin {
            return Err(RoomError::NotAuthorized);
        }
        let mut inner = self.inner.lock();
        let record = inner.get_mut(room)?;
        if record.admins.remove(&username_key(target)) {
            Ok(())
        } else {
            Err(RoomError::NotAdmin(target.to_string()))
        }
    }

    /// Members of `room`; from `General`, every room with a protection flag.
    pub fn listing(&self, room: &str) -> Result<RoomListing, RoomError> {
        let inner = self.inner.lock();
        let summarize = |r: &Room| RoomSummary {
            name: r.name.clone(),
            protected: r.is_protected(),
            members: r.members.iter().copied().collect(),
        };
        if room == GENERAL {
            Ok(RoomListing::All(inner.rooms.values().map(summarize).collect()))
        } else {
            Ok(RoomListing::Single(summarize(inner.get(room)?)))
        }
    }

    /// Verify the membership invariant. Test and debug aid.
    pub fn check_invariants(&self) -> Result<(), String> {
        let inner = self.inner.lock();
        for (session, room) in &inner.locations {
            let hits = inner
                .rooms
                .values()
                .filter(|r| r.members.contains(session))
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>();
            if hits != [room.as_str()] {
                return Err(format!("{session} recorded in {room} but member of {hits:?}"));
            }
        }
        for r in inner.rooms.values() {
            for session in &r.members {
                if inner.locations.get(session) != Some(&r.name) {
                    return Err(format!("{session} in {} without a matching pointer", r.name));
                }
            }
        }
        Ok(())
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}
