// Dashboard service - Assembles config-driven tiles and charts from one
// aggregation run
use crate::application::chart_service::{ChartService, WindowRequest};
use crate::domain::dashboard::{Dashboard, ChartData, ChartKind, SeriesData, SeriesPoint, TileData};
use crate::domain::telemetry::OutputPoint;
use crate::domain::vehicle::VehicleKind;
use crate::infrastructure::config::{DashboardConfig, TileConfig};

#[derive(Clone)]
pub struct DashboardService {
    chart_service: ChartService,
    dashboard_config: DashboardConfig,
}

impl DashboardService {
    pub fn new(chart_service: ChartService, dashboard_config: DashboardConfig) -> Self {
        Self {
            chart_service,
            dashboard_config,
        }
    }

    /// Build the dashboard for one vehicle: a single pipeline run feeds
    /// every tile and chart. Returns `None` for an unknown vehicle.
    pub async fn get_dashboard(
        &self,
        vehicle_id: &str,
        request: &WindowRequest,
    ) -> anyhow::Result<Option<Dashboard>> {
        let Some(vehicle) = self.chart_service.get_vehicle(vehicle_id).await? else {
            return Ok(None);
        };
        let Some(series) = self.chart_service.telemetry_series(vehicle_id, request).await? else {
            return Ok(None);
        };

        let tiles = self
            .dashboard_config
            .tiles
            .iter()
            .filter_map(|tile| build_tile(tile, &series.points, vehicle.kind))
            .collect();

        let mut charts = Vec::new();
        for chart_config in &self.dashboard_config.charts {
            let mut series_list = Vec::new();
            for series_config in &chart_config.series {
                let points: Vec<SeriesPoint> = series
                    .points
                    .iter()
                    .map(|p| {
                        SeriesPoint::new(p.ts_ms, field_value(p, vehicle.kind, &series_config.field))
                    })
                    .collect();

                if points.iter().any(|p| p.value.is_some()) {
                    series_list.push(SeriesData::new(
                        series_config.id.clone(),
                        series_config.name.clone(),
                        series_config.color.clone(),
                        points,
                    ));
                }
            }

            // Only add a chart if it has at least one series with data
            if !series_list.is_empty() {
                let kind = match chart_config.kind.as_str() {
                    "multiLine" => ChartKind::MultiLine,
                    _ => ChartKind::Line,
                };
                charts.push(ChartData {
                    id: chart_config.id.clone(),
                    title: chart_config.title.clone(),
                    unit: chart_config.unit.clone(),
                    kind,
                    y_min: chart_config.y_min,
                    y_max: chart_config.y_max,
                    fraction_digits: chart_config.fraction_digits,
                    series: series_list,
                });
            }
        }

        Ok(Some(Dashboard {
            title: format!("{} Telemetry", vehicle.name),
            from_ms: series.from_ms,
            to_ms: series.to_ms,
            bucket_width_ms: series.bucket_width_ms,
            tiles,
            charts,
        }))
    }
}

/// Pull one configured field out of an output point. The `level_pct`
/// pseudo-field resolves to whichever level the vehicle kind reports.
fn field_value(point: &OutputPoint, kind: VehicleKind, field: &str) -> Option<f64> {
    match field {
        "speed_avg" => point.speed_avg,
        "speed_min" => point.speed_min,
        "emissions_avg" => point.emissions_avg,
        "fuel_pct" => point.fuel_pct,
        "battery_pct" => point.battery_pct,
        "level_pct" => match kind {
            VehicleKind::Electric => point.battery_pct,
            VehicleKind::Combustion => point.fuel_pct,
        },
        _ => None,
    }
}

/// Reduce a field across the whole series for a tile; skipped when the
/// field never had data in the window.
fn build_tile(config: &TileConfig, points: &[OutputPoint], kind: VehicleKind) -> Option<TileData> {
    let values: Vec<f64> = points
        .iter()
        .filter_map(|p| field_value(p, kind, &config.field))
        .collect();

    let value = match config.stat.as_str() {
        "last" => values.last().copied(),
        "min" => values.iter().copied().reduce(f64::min),
        "max" => values.iter().copied().reduce(f64::max),
        "mean" => {
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        }
        "count" => Some(values.len() as f64),
        other => {
            tracing::warn!("Unknown tile stat '{}' for tile {}", other, config.id);
            None
        }
    }?;

    Some(TileData::new(
        config.id.clone(),
        config.title.clone(),
        config.unit.clone(),
        value,
        config.precision,
    ))
}
