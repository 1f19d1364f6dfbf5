// Application layer - Tracking use cases and ports
pub mod map_projector;
pub mod selection_coordinator;
pub mod session_registry;
pub mod tracking_api;
pub mod tracking_connection;
pub mod trail_buffer;
