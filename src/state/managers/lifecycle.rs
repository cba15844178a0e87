//! Lifecycle management state and behavior.
//!
//! Isolates server-wide shutdown signalling from the rest of the Matrix.

use tokio::sync::broadcast;
use tracing::info;

/// Shutdown signalling.
///
/// `/shutdown` fires the channel; the gateway stops accepting and every
/// connection task stops reading and flushes its queue.
pub struct LifecycleManager {
    shutdown_tx: broadcast::Sender<()>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        // Capacity 16 leaves room for several slow subscribers.
        let (shutdown_tx, _) = broadcast::channel(16);
        Self { shutdown_tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Fire the shutdown signal. Returns the number of listeners reached.
    pub fn shutdown(&self, reason: &str) -> usize {
        info!(reason = %reason, "Shutdown requested");
        self.shutdown_tx.send(()).unwrap_or(0)
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
