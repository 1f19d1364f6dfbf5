// Port to the map renderer
use crate::domain::position::PositionSample;
use crate::domain::session::{SessionId, TrackingSession};

/// What the tracking core asks of the map. The renderer itself lives outside
/// this crate; the core only issues drawing commands.
pub trait MapProjector: Send {
    /// Place or refresh the marker for a session at its last-known position.
    fn place_marker(&mut self, session: &TrackingSession);

    fn remove_marker(&mut self, session_id: SessionId);

    /// Draw the full trail polyline for a freshly seeded session.
    fn draw_trail(&mut self, session_id: SessionId, trail: &[PositionSample]);

    /// Extend the trail polyline with one accepted live sample.
    fn extend_trail(&mut self, session_id: SessionId, sample: &PositionSample);

    fn clear_trail(&mut self, session_id: SessionId);

    fn center_view(&mut self, lat: f64, lon: f64);
}
