// Trail buffer - Ordered position history for the focused session
use crate::domain::position::PositionSample;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

pub const DEFAULT_TRAIL_CAPACITY: usize = 5000;

/// The travel trail of one focused session: history seed plus accepted live
/// samples, strictly increasing by timestamp. A sample at or before the last
/// retained timestamp is stale or a duplicate and is discarded rather than
/// inserted out of position. Bounded; the oldest sample is evicted first.
pub struct TrailBuffer {
    samples: VecDeque<PositionSample>,
    capacity: usize,
}

impl TrailBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Replace the trail with a history fetch result. An empty history is
    /// valid; a disordered batch degrades to its increasing subsequence.
    pub fn seed(&mut self, history: Vec<PositionSample>) {
        self.samples.clear();
        let mut dropped = 0usize;
        for sample in history {
            if !self.admit(sample) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, "discarded out-of-order samples from history seed");
        }
    }

    /// Admit one live sample. Returns whether it was accepted.
    pub fn append(&mut self, sample: PositionSample) -> bool {
        self.admit(sample)
    }

    fn admit(&mut self, sample: PositionSample) -> bool {
        if let Some(last) = self.samples.back() {
            if sample.timestamp <= last.timestamp {
                return false;
            }
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        true
    }

    /// The current trail in order, for rendering.
    pub fn snapshot(&self) -> Vec<PositionSample> {
        self.samples.iter().copied().collect()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.back().map(|s| s.timestamp)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 4, 10, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    fn sample(secs: i64) -> PositionSample {
        PositionSample::new(-0.933 + secs as f64 * 1e-4, -78.617, Some(25.0), at(secs))
    }

    #[test]
    fn test_accepted_appends_keep_timestamps_strictly_increasing() {
        let mut buffer = TrailBuffer::new(DEFAULT_TRAIL_CAPACITY);
        for secs in [0, 3, 5, 10, 11] {
            assert!(buffer.append(sample(secs)));
        }

        let trail = buffer.snapshot();
        assert!(trail.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_stale_and_duplicate_samples_are_rejected() {
        let mut buffer = TrailBuffer::new(DEFAULT_TRAIL_CAPACITY);
        assert!(buffer.append(sample(10)));

        assert!(!buffer.append(sample(10)), "equal timestamp is a duplicate");
        assert!(!buffer.append(sample(5)), "older timestamp is stale");
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.last_timestamp(), Some(at(10)));
    }

    #[test]
    fn test_seed_replaces_content_and_accepts_empty() {
        let mut buffer = TrailBuffer::new(DEFAULT_TRAIL_CAPACITY);
        buffer.append(sample(1));

        buffer.seed(vec![sample(20), sample(21), sample(22)]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.last_timestamp(), Some(at(22)));

        buffer.seed(Vec::new());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_seed_with_disordered_history_keeps_increasing_subsequence() {
        let mut buffer = TrailBuffer::new(DEFAULT_TRAIL_CAPACITY);
        buffer.seed(vec![sample(0), sample(5), sample(3), sample(5), sample(8)]);

        let trail = buffer.snapshot();
        let kept: Vec<_> = trail.iter().map(|s| s.timestamp).collect();
        assert_eq!(kept, vec![at(0), at(5), at(8)]);
    }

    #[test]
    fn test_capacity_evicts_oldest_sample() {
        let mut buffer = TrailBuffer::new(3);
        for secs in 0..5 {
            assert!(buffer.append(sample(secs)));
        }

        let trail = buffer.snapshot();
        assert_eq!(trail.len(), 3);
        assert_eq!(trail.first().unwrap().timestamp, at(2));
        assert_eq!(trail.last().unwrap().timestamp, at(4));
    }
}
