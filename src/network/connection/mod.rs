//! Connection - handles an individual client.
//!
//! Each connection runs in its own Tokio task:
//!
//! ```text
//!   socket ──▶ FramedRead<LinesCodec> ──▶ Registry::dispatch
//!                                            │
//!   socket ◀── FramedWrite<LinesCodec> ◀── writer task ◀── session queue
//! ```
//!
//! Everything addressed to the session (replies, room broadcasts, private
//! messages) goes through its bounded queue, so only the writer task ever
//! touches the write half.

mod error_handling;

use error_handling::{ReadErrorAction, classify_read_error};

use crate::handlers::Registry;
use crate::state::{GENERAL, Line, Matrix};
use crate::telemetry::spans;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{Instrument, debug, info, warn};

use super::SHUTDOWN_GRACE;

/// A client connection handler.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    matrix: Arc<Matrix>,
    registry: Arc<Registry>,
    max_line_length: usize,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        matrix: Arc<Matrix>,
        registry: Arc<Registry>,
        max_line_length: usize,
    ) -> Self {
        Self {
            stream,
            peer,
            matrix,
            registry,
            max_line_length,
        }
    }

    /// Run the connection until the client leaves, the socket fails, or the
    /// server shuts down. Session cleanup happens exactly once on every path.
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            stream,
            peer,
            matrix,
            registry,
            max_line_length,
        } = self;

        // Subscribe before registering so a shutdown racing the connect is
        // not missed.
        let mut shutdown_rx = matrix.lifecycle.subscribe();
        let (guard, outgoing) = matrix.connect(peer.ip());
        let session = Arc::clone(guard.session());
        let span = spans::connection(&session.id().to_string(), session.addr());

        async move {
            let (read_half, write_half) = stream.into_split();
            let mut reader =
                FramedRead::new(read_half, LinesCodec::new_with_max_length(max_line_length));
            let mut writer = tokio::spawn(
                write_loop(FramedWrite::new(write_half, LinesCodec::new()), outgoing)
                    .in_current_span(),
            );

            session
                .send(format!("Welcome {} to the {GENERAL} room.", session.username()))
                .await?;

            // After a decode error the framed reader yields a single `None`
            // before it resumes reading.
            let mut resuming = false;
            loop {
                tokio::select! {
                    item = reader.next() => match item {
                        Some(Ok(line)) => {
                            resuming = false;
                            if let Err(e) = registry.dispatch(&matrix, &session, &line).await {
                                debug!(error = %e, "Outgoing queue closed");
                                break;
                            }
                        }
                        Some(Err(e)) => match classify_read_error(&e) {
                            ReadErrorAction::InputTooLong => {
                                warn!(max = max_line_length, "Line too long, discarded");
                                resuming = true;
                                if session
                                    .send(format!("Line too long (max {max_line_length} bytes)."))
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            ReadErrorAction::Fatal => {
                                debug!(error = %e, "Read error");
                                break;
                            }
                        },
                        None if resuming => resuming = false,
                        None => {
                            debug!("Client closed connection");
                            break;
                        }
                    },
                    _ = shutdown_rx.recv() => {
                        info!("Closing connection for shutdown");
                        break;
                    }
                }
            }

            // Dropping the last handle on the session closes its queue, which
            // lets the writer flush what is left and exit.
            drop(session);
            drop(guard);
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut writer).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Writer task failed"),
                Err(_) => {
                    // Peer stopped reading; release the write half anyway.
                    warn!("Writer did not drain in time, aborting");
                    writer.abort();
                }
            }
            Ok::<_, anyhow::Error>(())
        }
        .instrument(span)
        .await
    }
}

async fn write_loop(
    mut sink: FramedWrite<OwnedWriteHalf, LinesCodec>,
    mut outgoing: mpsc::Receiver<Line>,
) {
    while let Some(line) = outgoing.recv().await {
        if let Err(e) = sink.send(line).await {
            debug!(error = %e, "Write failed");
            return;
        }
    }
    let _ = SinkExt::<Line>::close(&mut sink).await;
}
