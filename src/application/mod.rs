// Application layer - Use cases and the aggregation pipeline
pub mod chart_service;
pub mod dashboard_service;
pub mod export_service;
pub mod pipeline;
pub mod telemetry_repository;
