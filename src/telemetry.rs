//! Standardized span constructors and log setup.

use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Span constructors for chat observability.
pub mod spans {
    use std::net::IpAddr;
    use tracing::{Span, info_span};

    /// Create a span for a client connection.
    pub fn connection(session: &str, addr: IpAddr) -> Span {
        info_span!("connection", session = %session, addr = %addr)
    }

    /// Create a span for a command execution.
    pub fn command(name: &str, username: &str, room: &str) -> Span {
        info_span!("command", name = %name, username = %username, room = %room)
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr filtered by `RUST_LOG` (default `info`). When
/// `activity_log` is given, the same events are also appended to that file
/// without ANSI colors.
pub fn init(activity_log: Option<File>) {
    let stderr = fmt::layer()
        .with_target(true)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file = activity_log.map(|f| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(f))
            .with_filter(EnvFilter::new("info"))
    });

    tracing_subscriber::registry().with(stderr).with(file).init();
}
