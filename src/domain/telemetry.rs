// Telemetry data domain models
use serde::Serialize;

/// One validated telemetry observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub vehicle_id: String,
    pub timestamp_ms: i64,
    pub speed_kmh: f64,
    pub emissions_g_per_km: f64,
    pub fuel_level_pct: Option<f64>,
    pub battery_level_pct: Option<f64>,
}

/// Requested query range in epoch milliseconds, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from_ms: i64,
    pub to_ms: i64,
}

impl TimeWindow {
    pub fn new(from_ms: i64, to_ms: i64) -> Self {
        Self { from_ms, to_ms }
    }

    pub fn span_ms(&self) -> i64 {
        self.to_ms - self.from_ms
    }

    pub fn contains(&self, ts_ms: i64) -> bool {
        ts_ms >= self.from_ms && ts_ms <= self.to_ms
    }

    /// Resolve an optional caller-supplied window against a default trailing
    /// span. With both bounds absent the window is the trailing `default_span_ms`
    /// ending at `now_ms`; a lone `from` runs up to `now_ms`, a lone `to` runs
    /// back one default span.
    pub fn resolve(
        from_ms: Option<i64>,
        to_ms: Option<i64>,
        default_span_ms: i64,
        now_ms: i64,
    ) -> Self {
        match (from_ms, to_ms) {
            (Some(from), Some(to)) => Self::new(from, to),
            (Some(from), None) => Self::new(from, now_ms),
            (None, Some(to)) => Self::new(to - default_span_ms, to),
            (None, None) => Self::new(now_ms - default_span_ms, now_ms),
        }
    }
}

/// One chart-ready row. A `None` field means no data landed in the bucket
/// and no carried value was available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputPoint {
    pub ts_ms: i64,
    pub speed_avg: Option<f64>,
    pub speed_min: Option<f64>,
    pub fuel_pct: Option<f64>,
    pub battery_pct: Option<f64>,
    pub emissions_avg: Option<f64>,
}

impl OutputPoint {
    pub fn empty(ts_ms: i64) -> Self {
        Self {
            ts_ms,
            speed_avg: None,
            speed_min: None,
            fuel_pct: None,
            battery_pct: None,
            emissions_avg: None,
        }
    }
}

/// Pipeline output: the aggregated points plus the resolved window and bucket
/// width, so a renderer can build a fixed tick domain over `[from, to]`
/// instead of auto-ranging on whatever data happened to arrive.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedSeries {
    pub from_ms: i64,
    pub to_ms: i64,
    pub bucket_width_ms: i64,
    pub points: Vec<OutputPoint>,
}
