//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "roomchat".to_string()
}

pub fn default_admin_username() -> String {
    "admin".to_string()
}

// =============================================================================
// Listen Defaults
// =============================================================================

pub fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 12345))
}

// =============================================================================
// Limits Defaults
// =============================================================================

pub fn default_max_line_length() -> usize {
    4096
}

pub fn default_outbound_queue() -> usize {
    256
}

pub fn default_max_mute_seconds() -> u64 {
    600
}

// =============================================================================
// Moderation Defaults
// =============================================================================

pub fn default_sweep_interval_secs() -> u64 {
    60
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_activity_log() -> Option<String> {
    Some("chatserver.log".to_string())
}
