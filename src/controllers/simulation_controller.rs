use crate::dto::simulation_dto::{ActiveVehicleResponse, AssignRouteRequest};
use crate::dto::ApiResponse;
use crate::services::simulation::{EngineStatus, SimulationEngine, SimulationScope};
use crate::utils::errors::{bad_request_error, AppError};
use std::sync::Arc;
use validator::Validate;

pub struct SimulationController {
    engine: Arc<SimulationEngine>,
}

impl SimulationController {
    pub fn new(engine: Arc<SimulationEngine>) -> Self {
        Self { engine }
    }

    pub async fn start(&self, route_id: Option<i32>) -> Result<ApiResponse<EngineStatus>, AppError> {
        let scope = parse_scope(route_id)?;
        let status = self.engine.start(scope).await?;
        Ok(ApiResponse::success_with_message(status, scope_message("Simulación iniciada", scope)))
    }

    pub async fn pause(&self, route_id: Option<i32>) -> Result<ApiResponse<EngineStatus>, AppError> {
        let scope = parse_scope(route_id)?;
        let status = self.engine.pause(scope).await?;
        Ok(ApiResponse::success_with_message(status, scope_message("Simulación pausada", scope)))
    }

    pub async fn restart(&self, route_id: Option<i32>) -> Result<ApiResponse<EngineStatus>, AppError> {
        let scope = parse_scope(route_id)?;
        let status = self.engine.restart(scope).await?;
        Ok(ApiResponse::success_with_message(status, scope_message("Simulación reiniciada", scope)))
    }

    pub async fn assign_route(
        &self,
        request: AssignRouteRequest,
    ) -> Result<ApiResponse<ActiveVehicleResponse>, AppError> {
        request.validate()?;

        let entry = self.engine.assign_route(request.vehicle_id, request.route_id).await?;
        let advancing = self.engine.is_advancing(&entry);

        Ok(ApiResponse::success_with_message(
            ActiveVehicleResponse::from_entry(entry, advancing),
            format!("Ruta {} asignada al autobús {}", request.route_id, request.vehicle_id),
        ))
    }

    pub async fn active_vehicles(&self) -> Vec<ActiveVehicleResponse> {
        self.engine
            .active_vehicles()
            .await
            .into_iter()
            .map(|entry| {
                let advancing = self.engine.is_advancing(&entry);
                ActiveVehicleResponse::from_entry(entry, advancing)
            })
            .collect()
    }

    pub async fn status(&self) -> EngineStatus {
        self.engine.status().await
    }
}

fn parse_scope(route_id: Option<i32>) -> Result<SimulationScope, AppError> {
    match route_id {
        Some(id) if id < 1 => Err(bad_request_error("route_id must be a positive integer")),
        _ => Ok(SimulationScope::from_route(route_id)),
    }
}

fn scope_message(action: &str, scope: SimulationScope) -> String {
    match scope {
        SimulationScope::All => format!("{} para todas las rutas habilitadas", action),
        SimulationScope::Route(route_id) => format!("{} para la ruta {}", action, route_id),
    }
}
