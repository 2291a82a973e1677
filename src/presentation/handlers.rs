// HTTP request handlers
use crate::application::chart_service::WindowRequest;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RangeQuery {
    fn into_window_request(self) -> WindowRequest {
        WindowRequest {
            from: self.from,
            to: self.to,
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all vehicles
pub async fn list_vehicles(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.chart_service.list_vehicles().await {
        Ok(vehicles) => Json(vehicles).into_response(),
        Err(e) => {
            tracing::error!("Error listing vehicles: {}", e);
            // Degrade to an empty list rather than failing the dashboard
            Json(Vec::<crate::domain::vehicle::Vehicle>::new()).into_response()
        }
    }
}

/// Aggregated telemetry series for one vehicle
pub async fn vehicle_telemetry(
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let request = query.into_window_request();
    match state.chart_service.telemetry_series(&id, &request).await {
        Ok(Some(series)) => Json(series).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Error aggregating telemetry for {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Full dashboard (tiles + charts) for one vehicle
pub async fn vehicle_dashboard(
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let request = query.into_window_request();
    match state.dashboard_service.get_dashboard(&id, &request).await {
        Ok(Some(dashboard)) => Json(dashboard).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Error building dashboard for {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Raw CSV export for one vehicle (full resolution, pre-aggregation)
pub async fn export_csv(
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let request = query.into_window_request();
    match state.export_service.export_csv(&id, &request).await {
        Ok(Some(csv)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Error exporting CSV for {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
