// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::get, Router};

use crate::application::chart_service::ChartService;
use crate::application::dashboard_service::DashboardService;
use crate::application::export_service::ExportService;
use crate::infrastructure::config::{load_dashboard_config, load_server_config};
use crate::infrastructure::file_repository::FileRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    export_csv, health_check, list_vehicles, vehicle_dashboard, vehicle_telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let server_config = load_server_config()?;
    let dashboard_config = load_dashboard_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(FileRepository::load(&server_config.server.data_file)?);

    // Create services (application layer)
    let chart_service = ChartService::new(
        repository.clone(),
        server_config.server.default_window_hours,
    );
    let dashboard_service = DashboardService::new(chart_service.clone(), dashboard_config);
    let export_service = ExportService::new(chart_service.clone());

    // Create application state
    let state = Arc::new(AppState {
        chart_service,
        dashboard_service,
        export_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/vehicles", get(list_vehicles))
        .route("/vehicles/:id/telemetry", get(vehicle_telemetry))
        .route("/vehicles/:id/dashboard", get(vehicle_dashboard))
        .route("/vehicles/:id/export.csv", get(export_csv))
        .with_state(state);

    // Start server
    let addr: SocketAddr = server_config.server.listen_addr.parse()?;
    tracing::info!("Starting fleet-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
