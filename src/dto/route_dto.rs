use serde::{Deserialize, Serialize};

// Query del listado de rutas; `all` incluye las deshabilitadas
#[derive(Debug, Default, Deserialize)]
pub struct RouteListQuery {
    #[serde(default)]
    pub all: bool,
}

// Request para cambiar la visibilidad de una ruta
#[derive(Debug, Deserialize)]
pub struct RouteVisibilityRequest {
    pub enabled: bool,
}

// Response de ruta eliminada
#[derive(Debug, Serialize)]
pub struct RouteDeletedResponse {
    pub route_id: i32,
    pub detached_vehicles: Vec<i32>,
}
