// Vehicle domain model
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    Combustion,
    Electric,
}

#[derive(Debug, Clone, Serialize)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    pub kind: VehicleKind,
}

impl Vehicle {
    pub fn new(id: String, kind: VehicleKind) -> Self {
        let name = Self::format_name(&id);
        Self { id, name, kind }
    }

    pub fn with_name(id: String, name: String, kind: VehicleKind) -> Self {
        Self { id, name, kind }
    }

    fn format_name(id: &str) -> String {
        // Convert "Delivery_Van_03" to "Delivery Van 03"
        id.trim_end_matches('_').replace('_', " ")
    }
}
