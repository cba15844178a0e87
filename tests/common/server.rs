//! Test server management.
//!
//! Runs a gateway in-process on an ephemeral loopback port. Addresses are
//! always simulated so every client gets a distinct address.

use super::client::TestClient;
use roomchat::config::{AddressMode, Config};
use roomchat::network::Gateway;
use roomchat::state::Matrix;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// A test server instance.
pub struct TestServer {
    addr: SocketAddr,
    matrix: Arc<Matrix>,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

#[allow(dead_code)]
impl TestServer {
    /// Spawn a server with default configuration.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(Config::default()).await
    }

    /// Spawn a server with the given configuration. The listen address and
    /// activity log are overridden.
    pub async fn spawn_with(mut config: Config) -> anyhow::Result<Self> {
        config.listen.address = "127.0.0.1:0".parse()?;
        config.logging.activity_log = None;

        let matrix = Arc::new(Matrix::new(&config, AddressMode::Simulated));
        let gateway = Gateway::bind(
            config.listen.address,
            Arc::clone(&matrix),
            config.limits.max_line_length,
        )
        .await?;
        let addr = gateway.local_addr()?;
        let handle = tokio::spawn(gateway.run());

        Ok(Self {
            addr,
            matrix,
            handle: Some(handle),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn matrix(&self) -> &Arc<Matrix> {
        &self.matrix
    }

    /// Connect a client and consume its welcome line.
    pub async fn connect(&self) -> anyhow::Result<TestClient> {
        TestClient::connect(self.addr).await
    }

    /// Connect a client and rename it.
    pub async fn connect_as(&self, username: &str) -> anyhow::Result<TestClient> {
        let mut client = self.connect().await?;
        client.rename(username).await?;
        Ok(client)
    }

    /// Poll until the server holds exactly `count` sessions.
    pub async fn wait_for_sessions(&self, count: usize) -> anyhow::Result<()> {
        timeout(Duration::from_secs(5), async {
            while self.matrix.sessions.len() != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "expected {count} sessions, still have {}",
                self.matrix.sessions.len()
            )
        })
    }

    /// Wait for the gateway to stop on its own, e.g. after `/shutdown`.
    pub async fn join(mut self) -> anyhow::Result<()> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow::anyhow!("server already stopped"))?;
        timeout(Duration::from_secs(10), handle).await???;
        Ok(())
    }

    /// Signal shutdown and wait for the gateway to stop.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.matrix.lifecycle.shutdown("test teardown");
        self.join().await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
