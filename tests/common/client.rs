//! Test chat client.
//!
//! Sends raw lines and asserts on received lines. ANSI color sequences are
//! stripped from everything received.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A test chat client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    username: String,
}

#[allow(dead_code)]
impl TestClient {
    /// Connect and wait for the welcome line, which carries the assigned name.
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer,
            username: String::new(),
        };

        let lines = client.recv_until(|l| l.starts_with("Welcome ")).await?;
        let welcome = lines.last().map(String::as_str).unwrap_or_default();
        client.username = welcome
            .strip_prefix("Welcome ")
            .and_then(|rest| rest.strip_suffix(" to the General room."))
            .ok_or_else(|| anyhow::anyhow!("unexpected welcome: {welcome:?}"))?
            .to_string();
        Ok(client)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Send one line.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive a single line.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(RECV_TIMEOUT).await
    }

    /// Receive a line with a timeout. EOF is an error.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed");
        }
        Ok(strip_ansi(line.trim_end_matches(['\r', '\n'])))
    }

    /// Receive lines until the predicate matches; returns all of them.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await?;
            let done = predicate(&line);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }
    }

    /// Skip lines until exactly `expected` arrives.
    pub async fn expect(&mut self, expected: &str) -> anyhow::Result<()> {
        self.recv_until(|l| l == expected)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("waiting for {expected:?}: {e}"))
    }

    /// Send a line and wait for `expected`.
    pub async fn exchange(&mut self, line: &str, expected: &str) -> anyhow::Result<()> {
        self.send(line).await?;
        self.expect(expected).await
    }

    pub async fn rename(&mut self, username: &str) -> anyhow::Result<()> {
        self.exchange(
            &format!("/username {username}"),
            &format!("Username changed to {username}"),
        )
        .await?;
        self.username = username.to_string();
        Ok(())
    }

    /// Assert nothing at all arrives within `dur`.
    pub async fn assert_silent(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_timeout(dur).await {
            Ok(line) => anyhow::bail!("expected silence, got {line:?}"),
            Err(e) if e.is::<tokio::time::error::Elapsed>() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Wait for the server to close the connection, skipping pending lines.
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        timeout(RECV_TIMEOUT, async {
            let mut line = String::new();
            loop {
                line.clear();
                match self.reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => {}
                }
            }
        })
        .await
        .map_err(|_| anyhow::anyhow!("connection still open"))
    }
}

fn strip_ansi(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
