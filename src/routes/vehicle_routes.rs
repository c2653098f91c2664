use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use crate::controllers::vehicle_controller::VehicleController;
use crate::services::simulation::CurrentPosition;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new().route("/:id/position", get(get_vehicle_position))
}

async fn get_vehicle_position(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CurrentPosition>, AppError> {
    let controller = VehicleController::new(state.engine.clone());
    Ok(Json(controller.current_position(id).await?))
}
