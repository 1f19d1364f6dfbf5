// Position sample domain model
use chrono::{DateTime, NaiveDateTime, Utc};

/// One recorded GPS fix for a route execution. Speed is reported by the
/// vehicle unit and may be absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub lat: f64,
    pub lon: f64,
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(lat: f64, lon: f64, speed: Option<f64>, timestamp: DateTime<Utc>) -> Self {
        Self {
            lat,
            lon,
            speed,
            timestamp,
        }
    }
}

/// Parse a timestamp as the tracking backend emits it. Producers that stamp
/// messages themselves send RFC 3339; the backend's own fallback stamp is a
/// naive ISO instant (`2026-01-04T10:30:00`), which is UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
