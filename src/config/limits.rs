//! Line, queue, and mute limits.

use super::defaults::{default_max_line_length, default_max_mute_seconds, default_outbound_queue};
use serde::Deserialize;

/// Resource limits.
///
/// These bound per-connection memory: a client cannot send an arbitrarily long
/// line, and a slow reader loses fan-out lines rather than growing a queue.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Longest accepted inbound line in bytes (default: 4096).
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Per-session outbound queue capacity in lines (default: 256).
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
    /// Ceiling for `/mute` durations (default: 600, never above 600).
    #[serde(default = "default_max_mute_seconds")]
    pub max_mute_seconds: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            outbound_queue: default_outbound_queue(),
            max_mute_seconds: default_max_mute_seconds(),
        }
    }
}
