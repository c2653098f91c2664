//! Modelo de Route y Waypoint
//!
//! Este módulo contiene los structs de rutas y sus puntos.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Route principal - mapea a la tabla routes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub id: i32,
    pub description: String,
    pub enabled: bool,
}

/// Punto de una ruta - mapea a la tabla waypoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Waypoint {
    pub id: i32,
    pub route_id: i32,
    /// Posición en la secuencia de recorrido, única dentro de la ruta
    pub order_index: i32,
    pub latitude: f64,
    pub longitude: f64,
}

/// Ruta con sus puntos ordenados por `order_index`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteWithWaypoints {
    #[serde(flatten)]
    pub route: Route,
    pub waypoints: Vec<Waypoint>,
}

impl RouteWithWaypoints {
    /// Construir a partir de puntos en cualquier orden
    pub fn new(route: Route, mut waypoints: Vec<Waypoint>) -> Self {
        waypoints.sort_by_key(|w| w.order_index);
        Self { route, waypoints }
    }
}
