use crate::application::tracking_connection::HEARTBEAT_PERIOD;
use crate::application::trail_buffer::DEFAULT_TRAIL_CAPACITY;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub tracking: TrackingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Base URL of the REST collaborator, e.g. `https://host/api`.
    pub base_url: String,
    /// Base URL of the streaming endpoint, e.g. `wss://host/api`.
    pub ws_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingSettings {
    /// Active-session discovery poll period.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Keepalive period expected by the streaming endpoint.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Retention cap for the focused session's trail; the oldest samples
    /// are evicted beyond it.
    #[serde(default = "default_trail_capacity")]
    pub trail_capacity: usize,
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_heartbeat_secs() -> u64 {
    HEARTBEAT_PERIOD.as_secs()
}

fn default_trail_capacity() -> usize {
    DEFAULT_TRAIL_CAPACITY
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            heartbeat_secs: default_heartbeat_secs(),
            trail_capacity: default_trail_capacity(),
        }
    }
}

impl TrackingSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

pub fn load_tracking_config() -> anyhow::Result<TrackingConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/tracking"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
