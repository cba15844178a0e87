//! Network listener configuration.

use super::defaults::default_listen_address;
use serde::Deserialize;
use std::net::SocketAddr;

/// Environment variable that switches the server into local mode.
pub const ENV_VAR: &str = "ROOMCHAT_ENV";

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:12345").
    #[serde(default = "default_listen_address")]
    pub address: SocketAddr,
    /// Assign each connection a sequential `127.x.y.z` address instead of its
    /// peer address, so local clients look like distinct hosts to bans.
    #[serde(default)]
    pub simulate_addresses: bool,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
            simulate_addresses: false,
        }
    }
}

/// How a connection's address is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Use the TCP peer address.
    Peer,
    /// Hand out sequential loopback addresses.
    Simulated,
}

impl ListenConfig {
    /// Resolve the address mode given the value of [`ENV_VAR`].
    ///
    /// `local` (case-insensitive) forces simulation on.
    pub fn address_mode(&self, env: Option<&str>) -> AddressMode {
        let local = env.is_some_and(|v| v.trim().eq_ignore_ascii_case("local"));
        if self.simulate_addresses || local {
            AddressMode::Simulated
        } else {
            AddressMode::Peer
        }
    }
}
