// Session registry - Poll-driven view of the executions currently in progress
use crate::application::tracking_api::{RegistryFetchError, TrackingApi};
use crate::domain::position::PositionSample;
use crate::domain::session::{SessionId, TrackingSession};
use std::collections::HashSet;
use std::sync::Arc;

/// What changed between two successful refreshes.
#[derive(Debug, Default)]
pub struct RegistryDelta {
    pub added: Vec<SessionId>,
    pub removed: Vec<SessionId>,
}

/// Ordered, deduplicated view of the active sessions, replaced wholesale on
/// each successful poll. A failed poll leaves the previous snapshot intact.
pub struct SessionRegistry {
    api: Arc<dyn TrackingApi>,
    sessions: Vec<TrackingSession>,
}

impl SessionRegistry {
    pub fn new(api: Arc<dyn TrackingApi>) -> Self {
        Self {
            api,
            sessions: Vec::new(),
        }
    }

    /// Fetch the current active sessions and swap them in. A session absent
    /// from the new snapshot has ended; one absent from the old snapshot is
    /// newly discovered.
    pub async fn refresh(&mut self) -> Result<RegistryDelta, RegistryFetchError> {
        let fetched = self.api.active_sessions().await?;

        // The backend is not trusted to list an execution only once.
        let mut seen = HashSet::new();
        let fresh: Vec<TrackingSession> = fetched
            .into_iter()
            .filter(|session| seen.insert(session.id))
            .collect();

        let old_ids: HashSet<SessionId> = self.sessions.iter().map(|s| s.id).collect();
        let new_ids: HashSet<SessionId> = fresh.iter().map(|s| s.id).collect();

        let delta = RegistryDelta {
            added: fresh
                .iter()
                .map(|s| s.id)
                .filter(|id| !old_ids.contains(id))
                .collect(),
            removed: self
                .sessions
                .iter()
                .map(|s| s.id)
                .filter(|id| !new_ids.contains(id))
                .collect(),
        };

        self.sessions = fresh;
        Ok(delta)
    }

    pub fn sessions(&self) -> &[TrackingSession] {
        &self.sessions
    }

    pub fn get(&self, session_id: SessionId) -> Option<&TrackingSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// First session in backend list order; the auto-selection candidate.
    pub fn first(&self) -> Option<&TrackingSession> {
        self.sessions.first()
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.sessions.iter().any(|s| s.id == session_id)
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Fold a live sample into a session's last-known state.
    pub fn record_position(&mut self, session_id: SessionId, sample: &PositionSample) {
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) {
            session.record_position(sample);
        }
    }
}
