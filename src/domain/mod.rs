// Domain layer - Core tracking data models
pub mod position;
pub mod session;
