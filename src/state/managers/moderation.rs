//! Moderation state: mutes and per-room address bans.
//!
//! Mute expiry is evaluated lazily on every check; [`ModerationStore::purge_expired`]
//! only reclaims memory and is never needed for correctness.

use crate::error::RoomError;
use crate::state::username_key;
use dashmap::DashMap;
use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;

/// Upper bound for any mute, in seconds.
pub const MAX_MUTE_SECS: u64 = 600;

/// Mute records and room ban sets.
///
/// Mutes are keyed by case-folded username and bans by address; neither is
/// tied to a session, so they keep applying when a name or address is reused.
pub struct ModerationStore {
    /// Folded username -> absolute expiry.
    mutes: DashMap<String, Instant>,
    /// Room name -> banned addresses.
    bans: DashMap<String, HashSet<IpAddr>>,
    max_mute: Duration,
}

impl ModerationStore {
    /// Create a store whose mutes are clamped to `max_mute_secs`
    /// (itself capped at [`MAX_MUTE_SECS`]).
    pub fn new(max_mute_secs: u64) -> Self {
        Self {
            mutes: DashMap::new(),
            bans: DashMap::new(),
            max_mute: Duration::from_secs(max_mute_secs.min(MAX_MUTE_SECS)),
        }
    }

    /// Apply the mute ceiling to a requested duration.
    pub fn clamp(&self, secs: u64) -> Duration {
        Duration::from_secs(secs).min(self.max_mute)
    }

    /// Mute `username` for `secs` (clamped), replacing any existing record.
    /// Returns the duration actually applied.
    pub fn mute(&self, username: &str, secs: u64) -> Duration {
        let duration = self.clamp(secs);
        self.mutes
            .insert(username_key(username), Instant::now() + duration);
        duration
    }

    /// Mute every listed user with the same expiry.
    pub fn mute_all<'a>(&self, usernames: impl IntoIterator<Item = &'a str>, secs: u64) -> Duration {
        let duration = self.clamp(secs);
        let until = Instant::now() + duration;
        for name in usernames {
            self.mutes.insert(username_key(name), until);
        }
        duration
    }

    /// Lift a mute. Reports `NotMuted` if there was no active one; an expired
    /// leftover record is discarded either way.
    pub fn unmute(&self, username: &str) -> Result<(), RoomError> {
        let now = Instant::now();
        match self.mutes.remove(&username_key(username)) {
            Some((_, until)) if until > now => Ok(()),
            _ => Err(RoomError::NotMuted(username.to_string())),
        }
    }

    /// Lift mutes for every listed user. Returns how many were active.
    pub fn unmute_all<'a>(&self, usernames: impl IntoIterator<Item = &'a str>) -> usize {
        let now = Instant::now();
        usernames
            .into_iter()
            .filter_map(|name| self.mutes.remove(&username_key(name)))
            .filter(|(_, until)| *until > now)
            .count()
    }

    /// True iff a record exists with expiry strictly after now.
    pub fn is_muted(&self, username: &str) -> bool {
        self.remaining(username).is_some()
    }

    /// Time left on an active mute.
    pub fn remaining(&self, username: &str) -> Option<Duration> {
        let now = Instant::now();
        self.mutes
            .get(&username_key(username))
            .map(|until| *until.value())
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    /// Drop expired mute records. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.mutes.len();
        self.mutes.retain(|_, until| *until > now);
        before.saturating_sub(self.mutes.len())
    }

    /// Bar `addr` from `room`. Returns `false` if it was already banned.
    pub fn ban(&self, room: &str, addr: IpAddr) -> bool {
        self.bans.entry(room.to_string()).or_default().insert(addr)
    }

    /// Lift an address ban. Returns `false` if the address was not banned.
    pub fn unban(&self, room: &str, addr: IpAddr) -> bool {
        self.bans
            .get_mut(room)
            .is_some_and(|mut set| set.remove(&addr))
    }

    pub fn is_banned(&self, room: &str, addr: IpAddr) -> bool {
        self.bans.get(room).is_some_and(|set| set.contains(&addr))
    }
}

impl Default for ModerationStore {
    fn default() -> Self {
        Self::new(MAX_MUTE_SECS)
    }
}
