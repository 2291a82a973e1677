// Repository trait for telemetry data access
use crate::domain::vehicle::Vehicle;
use async_trait::async_trait;
use serde::Deserialize;

/// One record as the Telemetry Store hands it over. Everything is optional
/// because the feed is noisy; validation happens in the normalizer, not here.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub vehicle_id: Option<String>,
    /// ISO-8601 timestamp string.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub emissions: Option<f64>,
    #[serde(default)]
    pub fuel_level: Option<f64>,
    #[serde(default)]
    pub battery_level: Option<f64>,
}

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// List all vehicles known to the store
    async fn list_vehicles(&self) -> anyhow::Result<Vec<Vehicle>>;

    /// Look up a single vehicle by id
    async fn get_vehicle(&self, vehicle_id: &str) -> anyhow::Result<Option<Vehicle>>;

    /// Fetch all raw telemetry records for one vehicle, unvalidated and in
    /// store order; window filtering is done downstream
    async fn fetch_records(&self, vehicle_id: &str) -> anyhow::Result<Vec<RawRecord>>;
}
