// Export service - Raw CSV export of normalized samples
//
// Deliberately reads the pre-aggregation samples, not the bucketed series:
// an export is expected to carry full resolution, not whatever the chart
// happened to downsample to.
use crate::application::chart_service::{ChartService, WindowRequest};
use crate::domain::telemetry::Sample;
use crate::domain::vehicle::VehicleKind;
use chrono::{TimeZone, Utc};

pub const CSV_HEADER: &str = "timestamp,speed,fuel_level,battery_level,emissions";

#[derive(Clone)]
pub struct ExportService {
    chart_service: ChartService,
}

impl ExportService {
    pub fn new(chart_service: ChartService) -> Self {
        Self { chart_service }
    }

    /// Build the CSV document for one vehicle over the requested window,
    /// one row per retained raw sample. Returns `None` for an unknown
    /// vehicle.
    pub async fn export_csv(
        &self,
        vehicle_id: &str,
        request: &WindowRequest,
    ) -> anyhow::Result<Option<String>> {
        let Some(vehicle) = self.chart_service.get_vehicle(vehicle_id).await? else {
            return Ok(None);
        };
        let window = self.chart_service.resolve_window(request);
        let samples = self.chart_service.normalized_samples(vehicle_id).await?;
        let retained: Vec<Sample> = samples
            .into_iter()
            .filter(|s| window.contains(s.timestamp_ms))
            .collect();
        Ok(Some(build_csv(&retained, vehicle.kind)))
    }
}

/// Serialize samples to CSV rows. Absent optional fields render as empty
/// strings; electric vehicles always export 0 emissions.
pub fn build_csv(samples: &[Sample], kind: VehicleKind) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for sample in samples {
        let timestamp = Utc
            .timestamp_millis_opt(sample.timestamp_ms)
            .single()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        let emissions = match kind {
            VehicleKind::Electric => 0.0,
            VehicleKind::Combustion => sample.emissions_g_per_km,
        };
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            timestamp,
            sample.speed_kmh,
            sample.fuel_level_pct.map(|v| v.to_string()).unwrap_or_default(),
            sample.battery_level_pct.map(|v| v.to_string()).unwrap_or_default(),
            emissions,
        ));
    }
    out
}
