// Tracking connection - Owns the single live stream for the focused session
use crate::domain::position::{parse_timestamp, PositionSample};
use crate::domain::session::SessionId;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Terminal. A closed connection is never reopened; a new one is built.
    Closed,
}

/// Transport-level failure on the live stream. Non-fatal: the session falls
/// back to Disconnected and the operator can reselect to retry.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("stream connect failed: {0}")]
    Connect(String),

    #[error("stream transport failed: {0}")]
    Transport(String),

    #[error("connection already closed")]
    Closed,
}

/// Events a connection reports back to its owner. Each carries the session
/// id and the connection generation so late arrivals from a torn-down
/// stream can be recognized and ignored.
#[derive(Debug)]
pub enum ConnectionEvent {
    Sample {
        session_id: SessionId,
        generation: u64,
        sample: PositionSample,
    },
    /// The server closed the stream. Informational, not an error.
    Closed {
        session_id: SessionId,
        generation: u64,
    },
    Failed {
        session_id: SessionId,
        generation: u64,
        error: StreamError,
    },
}

/// One open live stream. Implementations deliver inbound text frames and
/// carry the client keepalive.
#[async_trait]
pub trait LiveStream: Send {
    /// Next inbound text frame. `None` means the server closed the stream.
    async fn next_text(&mut self) -> Option<Result<String, StreamError>>;

    async fn send_keepalive(&mut self) -> Result<(), StreamError>;

    async fn close(&mut self);
}

/// Factory for live streams, one per focused session.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, session_id: SessionId) -> Result<Box<dyn LiveStream>, StreamError>;
}

#[derive(Debug, Deserialize)]
struct WirePositionUpdate {
    #[serde(rename = "type")]
    kind: String,
    ejecucion_id: SessionId,
    lat: f64,
    lon: f64,
    #[serde(default)]
    velocidad: Option<f64>,
    timestamp: String,
}

/// Owns at most one live stream for one session: handshake, heartbeat,
/// decode, teardown. The stream and its heartbeat timer live in a single
/// run task and are released together.
pub struct TrackingConnection {
    transport: Arc<dyn StreamTransport>,
    session_id: SessionId,
    generation: u64,
    heartbeat_period: Duration,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TrackingConnection {
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        session_id: SessionId,
        generation: u64,
        heartbeat_period: Duration,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            session_id,
            generation,
            heartbeat_period,
            events,
            state_tx,
            state_rx,
            shutdown: None,
            task: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Establish the stream and start the run task. Callable again from
    /// Disconnected after a transport failure; never after `close`.
    pub async fn open(&mut self) -> Result<(), StreamError> {
        match self.state() {
            ConnectionState::Closed => return Err(StreamError::Closed),
            ConnectionState::Connecting | ConnectionState::Connected => return Ok(()),
            ConnectionState::Disconnected => {}
        }
        // A previous run task has already finished by the time we are
        // Disconnected again; drop its handle.
        self.task.take();
        self.shutdown.take();

        let _ = self.state_tx.send(ConnectionState::Connecting);
        let stream = match self.transport.open(self.session_id).await {
            Ok(stream) => stream,
            Err(error) => {
                let _ = self.state_tx.send(ConnectionState::Disconnected);
                return Err(error);
            }
        };
        let _ = self.state_tx.send(ConnectionState::Connected);
        tracing::info!(session_id = %self.session_id, "live stream connected");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown = Some(shutdown_tx);
        self.task = Some(tokio::spawn(run_stream(
            stream,
            self.session_id,
            self.generation,
            self.heartbeat_period,
            self.events.clone(),
            self.state_tx.clone(),
            shutdown_rx,
        )));
        Ok(())
    }

    /// Idempotent, terminal teardown. Awaits the run task so the stream and
    /// heartbeat are fully released before the caller acquires replacements.
    pub async fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        let _ = self.state_tx.send(ConnectionState::Closed);
    }
}

async fn run_stream(
    mut stream: Box<dyn LiveStream>,
    session_id: SessionId,
    generation: u64,
    heartbeat_period: Duration,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    state: watch::Sender<ConnectionState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut heartbeat =
        tokio::time::interval_at(tokio::time::Instant::now() + heartbeat_period, heartbeat_period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                stream.close().await;
                return;
            }
            _ = heartbeat.tick() => {
                if let Err(error) = stream.send_keepalive().await {
                    tracing::warn!(%session_id, %error, "keepalive send failed");
                    stream.close().await;
                    let _ = state.send(ConnectionState::Disconnected);
                    let _ = events.send(ConnectionEvent::Failed { session_id, generation, error });
                    return;
                }
            }
            frame = stream.next_text() => match frame {
                Some(Ok(text)) => {
                    if let Some(sample) = decode_position_update(&text, session_id) {
                        let _ = events.send(ConnectionEvent::Sample { session_id, generation, sample });
                    }
                }
                Some(Err(error)) => {
                    tracing::warn!(%session_id, %error, "live stream transport error");
                    stream.close().await;
                    let _ = state.send(ConnectionState::Disconnected);
                    let _ = events.send(ConnectionEvent::Failed { session_id, generation, error });
                    return;
                }
                None => {
                    tracing::info!(%session_id, "live stream closed by server");
                    stream.close().await;
                    let _ = state.send(ConnectionState::Disconnected);
                    let _ = events.send(ConnectionEvent::Closed { session_id, generation });
                    return;
                }
            }
        }
    }
}

/// Decode one inbound frame. Anything that is not a well-formed
/// `position_update` for this session is dropped, never surfaced.
fn decode_position_update(text: &str, session_id: SessionId) -> Option<PositionSample> {
    // Keepalive ack from the server.
    if text == "pong" {
        return None;
    }
    let update: WirePositionUpdate = match serde_json::from_str(text) {
        Ok(update) => update,
        Err(error) => {
            tracing::debug!(%session_id, %error, "dropping undecodable frame");
            return None;
        }
    };
    if update.kind != "position_update" {
        tracing::debug!(%session_id, kind = %update.kind, "dropping unknown message kind");
        return None;
    }
    if update.ejecucion_id != session_id {
        tracing::debug!(
            %session_id,
            message_session = %update.ejecucion_id,
            "dropping update for a different session"
        );
        return None;
    }
    let Some(timestamp) = parse_timestamp(&update.timestamp) else {
        tracing::debug!(%session_id, raw = %update.timestamp, "dropping update with unreadable timestamp");
        return None;
    };
    Some(PositionSample::new(
        update.lat,
        update.lon,
        update.velocidad,
        timestamp,
    ))
}
