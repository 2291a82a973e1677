// Chart service - Use case for building aggregated telemetry series
use crate::application::pipeline::{self, parse_timestamp_ms};
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::telemetry::{AggregatedSeries, Sample, TimeWindow};
use crate::domain::vehicle::Vehicle;
use std::sync::Arc;

const HOUR_MS: i64 = 3_600_000;

/// Optional ISO-8601 window bounds as they arrive from the query string.
#[derive(Debug, Clone, Default)]
pub struct WindowRequest {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Clone)]
pub struct ChartService {
    repository: Arc<dyn TelemetryRepository>,
    default_window_hours: i64,
}

impl ChartService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, default_window_hours: i64) -> Self {
        Self {
            repository,
            default_window_hours,
        }
    }

    /// Resolve the requested window against "now". Unparsable bounds are
    /// treated as absent rather than rejected.
    pub fn resolve_window(&self, request: &WindowRequest) -> TimeWindow {
        let from_ms = request.from.as_deref().and_then(parse_timestamp_ms);
        let to_ms = request.to.as_deref().and_then(parse_timestamp_ms);
        let now_ms = chrono::Utc::now().timestamp_millis();
        TimeWindow::resolve(from_ms, to_ms, self.default_window_hours * HOUR_MS, now_ms)
    }

    pub async fn list_vehicles(&self) -> anyhow::Result<Vec<Vehicle>> {
        self.repository.list_vehicles().await
    }

    pub async fn get_vehicle(&self, vehicle_id: &str) -> anyhow::Result<Option<Vehicle>> {
        self.repository.get_vehicle(vehicle_id).await
    }

    /// Fetch and validate the raw samples for one vehicle. Shared by the
    /// aggregation path and the raw CSV export.
    pub async fn normalized_samples(&self, vehicle_id: &str) -> anyhow::Result<Vec<Sample>> {
        let records = self.repository.fetch_records(vehicle_id).await?;
        let samples = pipeline::normalize(&records);
        tracing::debug!(
            "Normalized {} of {} raw records for vehicle {}",
            samples.len(),
            records.len(),
            vehicle_id
        );
        Ok(samples)
    }

    /// Run the aggregation pipeline for one vehicle over the requested
    /// window. Returns `None` for an unknown vehicle.
    pub async fn telemetry_series(
        &self,
        vehicle_id: &str,
        request: &WindowRequest,
    ) -> anyhow::Result<Option<AggregatedSeries>> {
        let Some(vehicle) = self.repository.get_vehicle(vehicle_id).await? else {
            return Ok(None);
        };
        let window = self.resolve_window(request);
        let samples = self.normalized_samples(vehicle_id).await?;
        let series = pipeline::aggregate(&samples, Some(window), vehicle.kind);
        tracing::debug!(
            "Aggregated {} samples into {} points for vehicle {} (bucket width {} ms)",
            samples.len(),
            series.points.len(),
            vehicle_id,
            series.bucket_width_ms
        );
        Ok(Some(series))
    }
}
