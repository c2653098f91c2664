use crate::dto::route_dto::RouteDeletedResponse;
use crate::dto::ApiResponse;
use crate::models::{Route, RouteWithWaypoints};
use crate::services::simulation::{SimulationEngine, SimulationStore};
use crate::utils::errors::AppError;
use std::sync::Arc;

pub struct RouteController {
    store: Arc<dyn SimulationStore>,
    engine: Arc<SimulationEngine>,
}

impl RouteController {
    pub fn new(store: Arc<dyn SimulationStore>, engine: Arc<SimulationEngine>) -> Self {
        Self { store, engine }
    }

    /// Rutas con sus puntos; solo las habilitadas salvo `include_disabled`
    pub async fn list(&self, include_disabled: bool) -> Result<Vec<RouteWithWaypoints>, AppError> {
        Ok(self.store.list_routes_with_waypoints(!include_disabled).await?)
    }

    pub async fn set_visibility(&self, route_id: i32, enabled: bool) -> Result<ApiResponse<Route>, AppError> {
        let route = self.engine.set_route_visibility(route_id, enabled).await?;
        let message = if enabled { "Ruta habilitada" } else { "Ruta deshabilitada" };
        Ok(ApiResponse::success_with_message(route, message.to_string()))
    }

    pub async fn reload(&self, route_id: i32) -> Result<ApiResponse<RouteWithWaypoints>, AppError> {
        let route = self.engine.reload_route(route_id).await?;
        Ok(ApiResponse::success_with_message(route, "Ruta recargada".to_string()))
    }

    pub async fn delete(&self, route_id: i32) -> Result<ApiResponse<RouteDeletedResponse>, AppError> {
        let detached_vehicles = self.engine.delete_route(route_id).await?;
        Ok(ApiResponse::success_with_message(
            RouteDeletedResponse { route_id, detached_vehicles },
            "Ruta eliminada exitosamente".to_string(),
        ))
    }
}
