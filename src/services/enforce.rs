//! Periodic enforcement: reclaim expired mutes.
//!
//! Mute checks already treat expired entries as absent, so the sweeper only
//! bounds memory. It stops when the server shuts down.

use crate::state::Matrix;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawn the mute sweeper. A zero period disables it.
pub fn spawn_mute_sweeper(matrix: Arc<Matrix>, period: Duration) -> Option<JoinHandle<()>> {
    if period.is_zero() {
        info!("Mute sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut shutdown_rx = matrix.lifecycle.subscribe();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let purged = matrix.moderation.purge_expired();
                    if purged > 0 {
                        debug!(purged, "Expired mutes purged");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
        debug!("Mute sweeper stopped");
    }))
}
