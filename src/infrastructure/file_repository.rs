// File-backed Telemetry Store implementation
//
// Loads a fleet data file (JSON) once at startup and serves per-vehicle
// record queries from memory. Good enough for a depot-sized fleet; anything
// bigger swaps in a different `TelemetryRepository` behind the same trait.
use crate::application::telemetry_repository::{RawRecord, TelemetryRepository};
use crate::domain::vehicle::{Vehicle, VehicleKind};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read fleet data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse fleet data file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct FleetDataFile {
    #[serde(default)]
    vehicles: Vec<VehicleRecord>,
    #[serde(default)]
    samples: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct VehicleRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    kind: VehicleKind,
}

pub struct FileRepository {
    vehicles: Vec<Vehicle>,
    records_by_vehicle: HashMap<String, Vec<RawRecord>>,
}

impl FileRepository {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let data: FleetDataFile = serde_json::from_str(&raw)?;
        Ok(Self::from_data(data))
    }

    fn from_data(data: FleetDataFile) -> Self {
        let vehicles: Vec<Vehicle> = data
            .vehicles
            .into_iter()
            .map(|v| match v.name {
                Some(name) => Vehicle::with_name(v.id, name, v.kind),
                None => Vehicle::new(v.id, v.kind),
            })
            .collect();

        let mut records_by_vehicle: HashMap<String, Vec<RawRecord>> = HashMap::new();
        for record in data.samples {
            // Records without a vehicle id can never be served; everything
            // else is kept as-is and validated by the pipeline.
            if let Some(vehicle_id) = record.vehicle_id.clone() {
                records_by_vehicle.entry(vehicle_id).or_default().push(record);
            }
        }

        tracing::debug!(
            "Loaded {} vehicles, {} sample streams",
            vehicles.len(),
            records_by_vehicle.len()
        );
        Self {
            vehicles,
            records_by_vehicle,
        }
    }
}

#[async_trait]
impl TelemetryRepository for FileRepository {
    async fn list_vehicles(&self) -> anyhow::Result<Vec<Vehicle>> {
        Ok(self.vehicles.clone())
    }

    async fn get_vehicle(&self, vehicle_id: &str) -> anyhow::Result<Option<Vehicle>> {
        Ok(self.vehicles.iter().find(|v| v.id == vehicle_id).cloned())
    }

    async fn fetch_records(&self, vehicle_id: &str) -> anyhow::Result<Vec<RawRecord>> {
        Ok(self
            .records_by_vehicle
            .get(vehicle_id)
            .cloned()
            .unwrap_or_default())
    }
}
