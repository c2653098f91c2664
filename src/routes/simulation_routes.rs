use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use crate::controllers::simulation_controller::SimulationController;
use crate::dto::simulation_dto::{ActiveVehicleResponse, AssignRouteRequest, SimulationQuery};
use crate::dto::ApiResponse;
use crate::services::simulation::EngineStatus;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_simulation_router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start_simulation))
        .route("/pause", post(pause_simulation))
        .route("/restart", post(restart_simulation))
        .route("/assign", post(assign_route))
        .route("/active-vehicles", get(active_vehicles))
        .route("/status", get(simulation_status))
}

async fn start_simulation(
    State(state): State<AppState>,
    Query(query): Query<SimulationQuery>,
) -> Result<Json<ApiResponse<EngineStatus>>, AppError> {
    let controller = SimulationController::new(state.engine.clone());
    Ok(Json(controller.start(query.route_id).await?))
}

async fn pause_simulation(
    State(state): State<AppState>,
    Query(query): Query<SimulationQuery>,
) -> Result<Json<ApiResponse<EngineStatus>>, AppError> {
    let controller = SimulationController::new(state.engine.clone());
    Ok(Json(controller.pause(query.route_id).await?))
}

async fn restart_simulation(
    State(state): State<AppState>,
    Query(query): Query<SimulationQuery>,
) -> Result<Json<ApiResponse<EngineStatus>>, AppError> {
    let controller = SimulationController::new(state.engine.clone());
    Ok(Json(controller.restart(query.route_id).await?))
}

async fn assign_route(
    State(state): State<AppState>,
    Json(request): Json<AssignRouteRequest>,
) -> Result<Json<ApiResponse<ActiveVehicleResponse>>, AppError> {
    let controller = SimulationController::new(state.engine.clone());
    Ok(Json(controller.assign_route(request).await?))
}

async fn active_vehicles(State(state): State<AppState>) -> Json<Vec<ActiveVehicleResponse>> {
    let controller = SimulationController::new(state.engine.clone());
    Json(controller.active_vehicles().await)
}

async fn simulation_status(State(state): State<AppState>) -> Json<EngineStatus> {
    let controller = SimulationController::new(state.engine.clone());
    Json(controller.status().await)
}
