// Main entry point - Dependency injection and the tracking event loop
mod application;
mod domain;
mod infrastructure;

use std::sync::Arc;

use crate::application::selection_coordinator::SelectionCoordinator;
use crate::infrastructure::config::load_tracking_config;
use crate::infrastructure::rest_api::RestTrackingApi;
use crate::infrastructure::trace_projector::TraceProjector;
use crate::infrastructure::ws_transport::WsStreamTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_tracking_config()?;

    // Create collaborators (infrastructure layer)
    let api = Arc::new(RestTrackingApi::new(config.api.base_url.clone()));
    let transport = Arc::new(WsStreamTransport::new(config.api.ws_base_url.clone()));

    // Create the coordinator (application layer)
    let coordinator = SelectionCoordinator::new(
        api,
        transport,
        TraceProjector,
        config.tracking.heartbeat(),
        config.tracking.trail_capacity,
    );

    tracing::info!(
        base_url = %config.api.base_url,
        poll_secs = config.tracking.poll_interval_secs,
        "starting fleet tracking client"
    );

    coordinator.run(config.tracking.poll_interval()).await;

    Ok(())
}
