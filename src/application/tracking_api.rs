// Port to the tracking REST collaborator
use crate::domain::position::PositionSample;
use crate::domain::session::{SessionId, TrackingSession};
use async_trait::async_trait;
use thiserror::Error;

/// A failed call against the tracking endpoints. Non-fatal: the caller keeps
/// its previous data and retries on the next tick or reselect.
#[derive(Debug, Error)]
pub enum RegistryFetchError {
    #[error("tracking request failed: {0}")]
    Transport(String),

    #[error("tracking endpoint returned status {0}")]
    Status(u16),

    #[error("tracking response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TrackingApi: Send + Sync {
    /// Snapshot of every route execution currently reporting positions,
    /// in the order the backend lists them.
    async fn active_sessions(&self) -> Result<Vec<TrackingSession>, RegistryFetchError>;

    /// Every sample recorded so far for one execution, oldest first.
    async fn route_history(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PositionSample>, RegistryFetchError>;
}
