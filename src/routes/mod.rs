//! Routers de la API

pub mod observer_routes;
pub mod route_routes;
pub mod simulation_routes;
pub mod vehicle_routes;

use axum::{http::header, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::cors::cors_for;
use crate::services::simulation::metrics::gather_metrics;
use crate::state::AppState;

/// Crear el router completo de la aplicación
pub fn create_app_router(state: AppState) -> Router {
    let cors = cors_for(&state.config);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .nest("/api/simulation", simulation_routes::create_simulation_router())
        .nest("/api/routes", route_routes::create_route_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/ws", observer_routes::create_observer_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "livebus",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}
