// Selection coordinator - Binds focus to registry, stream, and trail lifecycles
use crate::application::map_projector::MapProjector;
use crate::application::session_registry::SessionRegistry;
use crate::application::tracking_api::TrackingApi;
use crate::application::tracking_connection::{
    ConnectionEvent, ConnectionState, StreamTransport, TrackingConnection,
};
use crate::application::trail_buffer::TrailBuffer;
use crate::domain::position::PositionSample;
use crate::domain::session::SessionId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// The connection/buffer pair for the session currently in focus.
struct FocusedSession {
    session_id: SessionId,
    generation: u64,
    buffer: TrailBuffer,
    connection: TrackingConnection,
}

/// Top-level lifecycle owner. The only place that builds or tears down
/// TrackingConnection and TrailBuffer instances, so a focus change can never
/// leak a stream or a timer. Single focus: at most one pair exists.
pub struct SelectionCoordinator<P: MapProjector> {
    api: Arc<dyn TrackingApi>,
    transport: Arc<dyn StreamTransport>,
    registry: SessionRegistry,
    projector: P,
    focused: Option<FocusedSession>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    heartbeat_period: Duration,
    trail_capacity: usize,
    generation: u64,
}

impl<P: MapProjector> SelectionCoordinator<P> {
    pub fn new(
        api: Arc<dyn TrackingApi>,
        transport: Arc<dyn StreamTransport>,
        projector: P,
        heartbeat_period: Duration,
        trail_capacity: usize,
    ) -> Self {
        let registry = SessionRegistry::new(api.clone());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            transport,
            registry,
            projector,
            focused: None,
            events_tx,
            events_rx,
            heartbeat_period,
            trail_capacity,
            generation: 0,
        }
    }

    pub fn focused_session(&self) -> Option<SessionId> {
        self.focused.as_ref().map(|f| f.session_id)
    }

    pub fn trail_len(&self) -> usize {
        self.focused.as_ref().map(|f| f.buffer.len()).unwrap_or(0)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// One registry poll: refresh, redraw markers, drop markers for ended
    /// sessions, defocus if the focused session ended, and focus the first
    /// listed session when nothing is focused yet.
    pub async fn handle_registry_tick(&mut self) {
        let delta = match self.registry.refresh().await {
            Ok(delta) => delta,
            Err(error) => {
                tracing::warn!(%error, "session registry refresh failed; keeping previous snapshot");
                return;
            }
        };

        tracing::debug!(active = self.registry.len(), "session registry refreshed");
        for session_id in &delta.added {
            tracing::debug!(%session_id, "session discovered");
        }
        for session_id in &delta.removed {
            self.projector.remove_marker(*session_id);
        }
        for session in self.registry.sessions() {
            self.projector.place_marker(session);
        }

        let focus_ended = self
            .focused
            .as_ref()
            .map(|f| f.session_id)
            .filter(|id| !self.registry.contains(*id));
        if let Some(session_id) = focus_ended {
            tracing::info!(%session_id, "focused session ended");
            self.deselect().await;
        }

        // Focus policy: with nothing focused, the first session in backend
        // list order is picked automatically.
        if self.focused.is_none() && !self.registry.is_empty() {
            if let Some(first) = self.registry.first().map(|s| s.id) {
                self.select(first).await;
            }
        }
    }

    /// Focus a session: tear the previous pair down first, then seed a fresh
    /// trail from history and open a fresh stream. Selecting the session
    /// already in focus is a no-op while its stream is up; with the stream
    /// down it reopens the stream and keeps the trail.
    pub async fn select(&mut self, session_id: SessionId) {
        if let Some(focused) = self
            .focused
            .as_mut()
            .filter(|f| f.session_id == session_id)
        {
            match focused.connection.state() {
                ConnectionState::Connected | ConnectionState::Connecting => {}
                _ => {
                    tracing::info!(%session_id, "reopening live stream for focused session");
                    if let Err(error) = focused.connection.open().await {
                        tracing::warn!(%session_id, %error, "live stream reconnect failed");
                    }
                }
            }
            return;
        }
        self.teardown_focus().await;

        let history = match self.api.route_history(session_id).await {
            Ok(points) => points,
            Err(error) => {
                tracing::warn!(%session_id, %error, "history fetch failed; starting with an empty trail");
                Vec::new()
            }
        };
        let mut buffer = TrailBuffer::new(self.trail_capacity);
        buffer.seed(history);
        if buffer.is_empty() {
            tracing::debug!(%session_id, "no history recorded yet");
        }

        self.generation += 1;
        let generation = self.generation;
        let mut connection = TrackingConnection::new(
            self.transport.clone(),
            session_id,
            generation,
            self.heartbeat_period,
            self.events_tx.clone(),
        );
        if let Err(error) = connection.open().await {
            tracing::warn!(%session_id, %error, "live stream connect failed; showing history only");
        }

        let trail = buffer.snapshot();
        self.projector.draw_trail(session_id, &trail);
        if let Some(session) = self.registry.get(session_id) {
            self.projector.center_view(session.lat, session.lon);
        } else if let Some(last) = trail.last() {
            self.projector.center_view(last.lat, last.lon);
        }

        self.focused = Some(FocusedSession {
            session_id,
            generation,
            buffer,
            connection,
        });
    }

    /// Drop focus without picking a replacement.
    pub async fn deselect(&mut self) {
        self.teardown_focus().await;
    }

    async fn teardown_focus(&mut self) {
        if let Some(mut focused) = self.focused.take() {
            focused.connection.close().await;
            self.projector.clear_trail(focused.session_id);
        }
    }

    /// Apply one connection event. Events from a torn-down stream (wrong
    /// session or older generation) are ignored.
    pub fn handle_event(&mut self, event: ConnectionEvent) {
        let Some(focused) = &mut self.focused else {
            return;
        };
        match event {
            ConnectionEvent::Sample {
                session_id,
                generation,
                sample,
            } => {
                if session_id != focused.session_id || generation != focused.generation {
                    tracing::debug!(%session_id, "ignoring sample from a stale stream");
                    return;
                }
                if focused.buffer.append(sample) {
                    self.registry.record_position(session_id, &sample);
                    self.projector.extend_trail(session_id, &sample);
                    self.projector.center_view(sample.lat, sample.lon);
                } else {
                    tracing::debug!(
                        %session_id,
                        sample_at = %sample.timestamp,
                        trail_at = ?focused.buffer.last_timestamp(),
                        "discarded stale or duplicate live sample"
                    );
                }
            }
            ConnectionEvent::Closed {
                session_id,
                generation,
            } => {
                if session_id == focused.session_id && generation == focused.generation {
                    tracing::info!(%session_id, "live stream ended; reselect to resume");
                }
            }
            ConnectionEvent::Failed {
                session_id,
                generation,
                error,
            } => {
                if session_id == focused.session_id && generation == focused.generation {
                    tracing::warn!(%session_id, %error, "live stream failed; reselect to retry");
                }
            }
        }
    }

    /// Receive and apply the next connection event. False when the channel
    /// is exhausted.
    pub async fn pump_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Event loop for the binary: poll ticks, connection events, ctrl-c.
    pub async fn run(mut self, poll_period: Duration) {
        let mut poll = tokio::time::interval(poll_period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = poll.tick() => self.handle_registry_tick().await,
                pumped = self.pump_event() => {
                    if !pumped {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutting down tracking client");
                    break;
                }
            }
        }
        self.shutdown().await;
    }

    /// Release everything on the way out: the focused stream, its heartbeat,
    /// and the markers. After this no event produces an observable mutation.
    pub async fn shutdown(&mut self) {
        self.teardown_focus().await;
        for session_id in self
            .registry
            .sessions()
            .iter()
            .map(|s| s.id)
            .collect::<Vec<_>>()
        {
            self.projector.remove_marker(session_id);
        }
    }
}
