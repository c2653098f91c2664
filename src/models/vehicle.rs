//! Modelo de Vehicle
//!
//! Mapea a la tabla vehicles. `waypoint_index` es el desplazamiento dentro de los
//! puntos ordenados de la ruta asignada.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::route::RouteWithWaypoints;

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: i32,
    pub name: Option<String>,
    pub status: Option<String>,
    pub route_id: Option<i32>,
    pub waypoint_index: i32,
}

impl Vehicle {
    /// Asignar (o reasignar) una ruta, reiniciando el punto actual
    pub fn assign_route(&mut self, route_id: i32) {
        self.route_id = Some(route_id);
        self.waypoint_index = 0;
    }

    /// Desasignar la ruta, reiniciando el punto actual
    pub fn detach_route(&mut self) {
        self.route_id = None;
        self.waypoint_index = 0;
    }
}

/// Vehículo junto con su ruta cargada (si tiene)
#[derive(Debug, Clone)]
pub struct VehicleWithRoute {
    pub vehicle: Vehicle,
    pub route: Option<RouteWithWaypoints>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle() -> Vehicle {
        Vehicle {
            id: 1,
            name: Some("Bus 1".into()),
            status: Some("en servicio".into()),
            route_id: Some(4),
            waypoint_index: 5,
        }
    }

    #[test]
    fn test_assign_route_resets_index() {
        let mut v = vehicle();
        v.assign_route(9);
        assert_eq!(v.route_id, Some(9));
        assert_eq!(v.waypoint_index, 0);
    }

    #[test]
    fn test_detach_route_resets_index() {
        let mut v = vehicle();
        v.detach_route();
        assert_eq!(v.route_id, None);
        assert_eq!(v.waypoint_index, 0);
    }
}
