//! Identifier and address generation for new connections.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Stable identity of a live session.
///
/// Independent of the (mutable) username; used for equality and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Generates session ids and the matching default usernames.
///
/// Counters start at 1 so the first connection is `User1`.
pub struct SessionIdGenerator {
    counter: AtomicU64,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Allocate the next id together with its default username.
    pub fn next(&self) -> (SessionId, String) {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        (SessionId(n), format!("User{n}"))
    }
}

impl Default for SessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of distinct simulated addresses: `127.0.0.1` through
/// `127.255.255.254`.
const SIMULATED_HOSTS: u32 = 0x00FF_FFFE;

/// Hands out sequential loopback-style addresses (`127.0.0.1`, `127.0.0.2`, ...).
///
/// Used in local mode so several clients on one machine look like distinct
/// hosts to the ban logic. After `SIMULATED_HOSTS` connections the
/// sequence starts again at `127.0.0.1`, so a later client can share an
/// earlier one's address and its bans.
pub struct AddressAllocator {
    counter: AtomicU32,
}

impl AddressAllocator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU32::new(1),
        }
    }

    pub fn next(&self) -> IpAddr {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let host = n.wrapping_sub(1) % SIMULATED_HOSTS + 1;
        let [_, b, c, d] = host.to_be_bytes();
        IpAddr::V4(Ipv4Addr::new(127, b, c, d))
    }
}

impl Default for AddressAllocator {
    fn default() -> Self {
        Self::new()
    }
}
