// Infrastructure layer - External collaborators and adapters
pub mod config;
pub mod rest_api;
pub mod trace_projector;
pub mod ws_transport;
