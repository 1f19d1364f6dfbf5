// Tracking session domain model
use crate::domain::position::PositionSample;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Opaque identifier for one in-progress route execution. Stable for the
/// lifetime of the execution; the backend encodes it as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One route execution currently reporting positions, as last seen by a
/// registry poll or a live update.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    pub id: SessionId,
    pub driver_name: String,
    pub vehicle_plate: String,
    pub sector: String,
    pub lat: f64,
    pub lon: f64,
    pub speed: Option<f64>,
    pub last_update: DateTime<Utc>,
    pub status: String,
}

impl TrackingSession {
    /// Fold a live sample into the last-known state.
    pub fn record_position(&mut self, sample: &PositionSample) {
        self.lat = sample.lat;
        self.lon = sample.lon;
        self.speed = sample.speed;
        self.last_update = sample.timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_position_updates_last_known_state() {
        let mut session = TrackingSession {
            id: SessionId(7),
            driver_name: "Maria Lopez".to_string(),
            vehicle_plate: "PBX-1234".to_string(),
            sector: "Norte".to_string(),
            lat: -0.933,
            lon: -78.617,
            speed: Some(18.0),
            last_update: Utc.with_ymd_and_hms(2026, 1, 4, 10, 30, 0).unwrap(),
            status: "en_curso".to_string(),
        };

        let sample = PositionSample::new(
            -0.931,
            -78.615,
            None,
            Utc.with_ymd_and_hms(2026, 1, 4, 10, 30, 5).unwrap(),
        );
        session.record_position(&sample);

        assert_eq!(session.lat, -0.931);
        assert_eq!(session.lon, -78.615);
        assert_eq!(session.speed, None);
        assert_eq!(session.last_update, sample.timestamp);
    }
}
