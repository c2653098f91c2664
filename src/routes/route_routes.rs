use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use crate::controllers::route_controller::RouteController;
use crate::dto::route_dto::{RouteDeletedResponse, RouteListQuery, RouteVisibilityRequest};
use crate::dto::ApiResponse;
use crate::models::{Route, RouteWithWaypoints};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routes))
        .route("/:id", delete(delete_route))
        .route("/:id/visibility", post(set_route_visibility))
        .route("/:id/reload", post(reload_route))
}

fn controller(state: &AppState) -> RouteController {
    RouteController::new(state.store.clone(), state.engine.clone())
}

async fn list_routes(
    State(state): State<AppState>,
    Query(query): Query<RouteListQuery>,
) -> Result<Json<Vec<RouteWithWaypoints>>, AppError> {
    Ok(Json(controller(&state).list(query.all).await?))
}

async fn set_route_visibility(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<RouteVisibilityRequest>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    Ok(Json(controller(&state).set_visibility(id, request.enabled).await?))
}

async fn reload_route(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RouteWithWaypoints>>, AppError> {
    Ok(Json(controller(&state).reload(id).await?))
}

async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RouteDeletedResponse>>, AppError> {
    Ok(Json(controller(&state).delete(id).await?))
}
