//! Connection - Handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task:
//!
//! ```text
//!    ┌───────────────────────────────────────────────┐
//!    │               Connection Task                 │
//!    │                                               │
//!    │  ┌─────────────┐            ┌─────────────┐   │
//!    │  │  FramedRead │            │ FramedWrite │   │
//!    │  └──────┬──────┘            └──────▲──────┘   │
//!    │         ▼                          │          │
//!    │   tokio::select! ◄── probe tick    │          │
//!    │    │    ▲                          │          │
//!    │    │    └── kill switch            │          │
//!    │    ▼                               │          │
//!    │  [Registry] ───────▶ [Outgoing Queue] ◄── fanout from other tasks
//!    └───────────────────────────────────────────────┘
//! ```
//!
//! When the loop ends the session is removed from the [`Matrix`] first;
//! only then are queued messages flushed and the transport closed.

use super::liveness::{Liveness, LivenessAction};
use crate::handlers::{Context, HandlerError, HandshakeState, Registry, closing_link};
use crate::state::{Matrix, SEND_QUEUE_EXCEEDED};
use crate::telemetry::spans;
use futures_util::{SinkExt, StreamExt};
use relay_proto::{IrcCodec, Message};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{Instrument, debug, info, warn};

/// QUIT reason when the client gives none.
const DEFAULT_QUIT_REASON: &str = "Client Quit";

/// Why the connection loop ended.
#[derive(Debug)]
enum Exit {
    /// Client sent QUIT.
    Quit(String),
    /// No traffic within the idle limit.
    PingTimeout(u64),
    /// Terminated by the server (queue overflow, framing error).
    Terminated(String),
    /// The transport closed or failed; nothing more can be written.
    Closed(String),
    /// Another task already removed the session.
    Killed,
}

impl Exit {
    /// Reason recorded on the registry teardown.
    fn reason(&self) -> String {
        match self {
            Self::Quit(reason) | Self::Terminated(reason) | Self::Closed(reason) => reason.clone(),
            Self::PingTimeout(secs) => format!("Ping timeout: {} seconds", secs),
            Self::Killed => "Killed".to_string(),
        }
    }

    /// The `ERROR` notice text written before closing, if any.
    fn notice(&self) -> Option<String> {
        match self {
            Self::Quit(reason) => Some(format!("Quit: {}", reason)),
            Self::PingTimeout(_) | Self::Terminated(_) => Some(self.reason()),
            Self::Closed(_) | Self::Killed => None,
        }
    }

    fn can_write(&self) -> bool {
        !matches!(self, Self::Closed(_))
    }
}

/// A client connection handler.
pub struct Connection {
    uid: String,
    addr: SocketAddr,
    matrix: Arc<Matrix>,
    registry: Arc<Registry>,
    stream: TcpStream,
}

impl Connection {
    /// Create a new connection handler.
    pub fn new(
        uid: String,
        stream: TcpStream,
        addr: SocketAddr,
        matrix: Arc<Matrix>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            uid,
            addr,
            matrix,
            registry,
            stream,
        }
    }

    /// Run the connection until the session ends.
    pub async fn run(self) -> anyhow::Result<()> {
        let span = spans::connection(&self.uid, &self.addr);
        self.serve().instrument(span).await
    }

    async fn serve(self) -> anyhow::Result<()> {
        let Self {
            uid,
            addr,
            matrix,
            registry,
            stream,
        } = self;

        info!(server = %matrix.server_info.name, "Client connected");

        let limits = &matrix.config.limits;
        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, IrcCodec::with_max_len(limits.max_line_len));
        let mut writer = FramedWrite::new(write_half, IrcCodec::with_max_len(limits.max_line_len));

        // Handlers queue replies here; other sessions' fanout lands here too.
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Message>(limits.send_queue.max(1));
        let host = addr.ip().to_string();
        let kill = matrix.attach(&uid, &host, outgoing_tx.clone());

        let mut handshake = HandshakeState::default();
        let mut liveness = Liveness::new(Instant::now(), matrix.config.idle_timeouts.idle_limit());
        let ping_interval = matrix.config.idle_timeouts.ping_interval();
        let now = tokio::time::Instant::now();
        let first_probe = now.checked_add(ping_interval).unwrap_or(now);
        let mut probe_timer = interval_at(first_probe, ping_interval);
        probe_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exit = loop {
            tokio::select! {
                result = reader.next() => match result {
                    Some(Ok(line)) => {
                        liveness.touch(Instant::now());
                        debug!(raw = %line, "Received line");

                        let mut ctx = Context {
                            uid: &uid,
                            matrix: &matrix,
                            sender: &outgoing_tx,
                            handshake: &mut handshake,
                        };
                        match registry.handle_line(&mut ctx, &line).await {
                            Ok(()) => {}
                            Err(HandlerError::Quit(reason)) => {
                                let reason = reason.unwrap_or_else(|| DEFAULT_QUIT_REASON.to_string());
                                break Exit::Quit(reason);
                            }
                            Err(HandlerError::Send) => {
                                break Exit::Terminated(SEND_QUEUE_EXCEEDED.to_string());
                            }
                            Err(e) => warn!(error = %e, "Handler failed"),
                        }
                    }
                    Some(Err(e)) if e.is_framing() => {
                        warn!(error = %e, "Framing error");
                        break Exit::Terminated(e.to_string());
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Read error");
                        break Exit::Closed(format!("Read error: {}", e));
                    }
                    None => {
                        debug!("Client closed the connection");
                        break Exit::Closed("Connection closed".to_string());
                    }
                },

                Some(msg) = outgoing_rx.recv() => {
                    if let Err(e) = writer.send(msg).await {
                        warn!(error = %e, "Write error");
                        break Exit::Closed(format!("Write error: {}", e));
                    }
                }

                _ = probe_timer.tick() => match liveness.on_tick(Instant::now()) {
                    LivenessAction::SendPing => {
                        debug!(idle_secs = liveness.idle(Instant::now()).as_secs(), "Sending PING");
                        if outgoing_tx.try_send(Message::ping(&matrix.server_info.name)).is_err() {
                            break Exit::Terminated(SEND_QUEUE_EXCEEDED.to_string());
                        }
                    }
                    LivenessAction::Timeout { idle_secs } => {
                        info!(nick = ?handshake.nick, idle_secs, "Ping timeout - disconnecting");
                        break Exit::PingTimeout(idle_secs);
                    }
                },

                _ = kill.notified() => {
                    debug!("Session removed by server");
                    break Exit::Killed;
                }
            }
        };

        // The session leaves the registry before the transport closes.
        let reason = exit.reason();
        matrix.quit(&uid, &reason);

        if exit.can_write() {
            while let Ok(msg) = outgoing_rx.try_recv() {
                if writer.feed(msg).await.is_err() {
                    break;
                }
            }
            if let Some(notice) = exit.notice() {
                let _ = writer.feed(closing_link(&host, &notice)).await;
            }
        }
        if let Err(e) = writer.close().await {
            debug!(error = %e, "Error closing transport");
        }

        info!(nick = ?handshake.nick, %reason, "Client disconnected");
        Ok(())
    }
}
