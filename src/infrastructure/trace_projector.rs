// Map port backed by tracing, for running the client without a UI
use crate::application::map_projector::MapProjector;
use crate::domain::position::PositionSample;
use crate::domain::session::{SessionId, TrackingSession};

/// Logs every drawing command instead of rendering. Stands in for the map
/// library, which lives outside this crate.
pub struct TraceProjector;

impl MapProjector for TraceProjector {
    fn place_marker(&mut self, session: &TrackingSession) {
        tracing::info!(
            session_id = %session.id,
            plate = %session.vehicle_plate,
            lat = session.lat,
            lon = session.lon,
            speed = ?session.speed,
            "marker"
        );
    }

    fn remove_marker(&mut self, session_id: SessionId) {
        tracing::info!(%session_id, "marker removed");
    }

    fn draw_trail(&mut self, session_id: SessionId, trail: &[PositionSample]) {
        tracing::info!(%session_id, samples = trail.len(), "trail drawn");
    }

    fn extend_trail(&mut self, session_id: SessionId, sample: &PositionSample) {
        tracing::info!(
            %session_id,
            lat = sample.lat,
            lon = sample.lon,
            speed = ?sample.speed,
            "trail extended"
        );
    }

    fn clear_trail(&mut self, session_id: SessionId) {
        tracing::info!(%session_id, "trail cleared");
    }

    fn center_view(&mut self, lat: f64, lon: f64) {
        tracing::debug!(lat, lon, "view centered");
    }
}
