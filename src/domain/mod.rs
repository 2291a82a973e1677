// Domain layer - Core models shared across the application
pub mod dashboard;
pub mod telemetry;
pub mod vehicle;
