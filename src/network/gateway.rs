//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listening socket and spawns a [`Connection`] task
//! per client. It stops accepting when the lifecycle manager signals
//! shutdown, then gives open connections a grace period to flush.

use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::Matrix;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// How long connections get to flush their queues once shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    matrix: Arc<Matrix>,
    registry: Arc<Registry>,
    max_line_length: usize,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(
        addr: SocketAddr,
        matrix: Arc<Matrix>,
        max_line_length: usize,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            server = %matrix.config.server_name,
            address = %listener.local_addr()?,
            "Listener bound"
        );
        Ok(Self {
            listener,
            matrix,
            registry: Arc::new(Registry::new()),
            max_line_length,
        })
    }

    /// The bound address. Useful when binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until shutdown.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        let mut shutdown_rx = self.matrix.lifecycle.subscribe();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "Accepted connection");
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!(%peer, error = %e, "Failed to set TCP_NODELAY");
                        }
                        let connection = Connection::new(
                            stream,
                            peer,
                            Arc::clone(&self.matrix),
                            Arc::clone(&self.registry),
                            self.max_line_length,
                        );
                        connections.spawn(async move {
                            if let Err(e) = connection.run().await {
                                debug!(%peer, error = %e, "Connection ended with error");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "Accept failed"),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Connection task panicked");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!(open = connections.len(), "Gateway stopping");
                    break;
                }
            }
        }
        drop(self.listener);

        let drained = tokio::time::timeout(SHUTDOWN_GRACE * 2, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(remaining = connections.len(), "Aborting connections after grace period");
            connections.abort_all();
        }

        let stats: Vec<String> = self
            .registry
            .command_stats()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, count)| format!("{name}={count}"))
            .collect();
        info!(commands = %stats.join(" "), "Gateway stopped");
        Ok(())
    }
}
