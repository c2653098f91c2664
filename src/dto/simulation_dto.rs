use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::simulation::FleetEntry;

// Query opcional para limitar la operación a una ruta
#[derive(Debug, Default, Deserialize)]
pub struct SimulationQuery {
    pub route_id: Option<i32>,
}

// Request para asignar una ruta a un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct AssignRouteRequest {
    #[validate(range(min = 1))]
    pub vehicle_id: i32,

    #[validate(range(min = 1))]
    pub route_id: i32,
}

// Vehículo del registro de la flota
#[derive(Debug, Serialize)]
pub struct ActiveVehicleResponse {
    pub vehicle_id: i32,
    pub name: Option<String>,
    pub status: Option<String>,
    pub route_id: Option<i32>,
    pub current_index: usize,
    pub waypoint_count: usize,
    pub route_enabled: bool,
    pub advancing: bool,
}

impl ActiveVehicleResponse {
    pub fn from_entry(entry: FleetEntry, advancing: bool) -> Self {
        let (waypoint_count, route_enabled) = entry
            .route
            .as_ref()
            .map(|r| (r.waypoints.len(), r.is_enabled()))
            .unwrap_or((0, false));

        Self {
            vehicle_id: entry.vehicle_id,
            route_id: entry.route_id(),
            name: entry.name,
            status: entry.status,
            current_index: entry.current_index,
            waypoint_count,
            route_enabled,
            advancing,
        }
    }
}
