mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::{test_config, InMemoryStore};
use livebus::config::EnvironmentConfig;
use livebus::routes::create_app_router;
use livebus::services::simulation::{BroadcastPublisher, SimulationEngine, SimulationEvent};
use livebus::state::AppState;

struct TestApp {
    router: Router,
    engine: Arc<SimulationEngine>,
    events: BroadcastPublisher,
    store: InMemoryStore,
}

async fn create_test_app() -> TestApp {
    let store = InMemoryStore::new();
    store.add_route(1, true, &[(42.24, -8.72), (42.23, -8.71)]);
    store.add_route(2, false, &[(42.20, -8.70)]);
    store.add_vehicle(1, Some(1));
    store.add_vehicle(2, None);

    let events = BroadcastPublisher::new(64);
    let engine = Arc::new(SimulationEngine::new(
        Arc::new(store.clone()),
        Arc::new(events.clone()),
        test_config(),
    ));
    engine.load_initial_data().await.unwrap();

    let state = AppState::new(EnvironmentConfig::default(), Arc::new(store.clone()), engine.clone(), events.clone());
    TestApp {
        router: create_app_router(state),
        engine,
        events,
        store,
    }
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "livebus");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_start_and_pause_global() {
    let app = create_test_app().await;

    let (status, body) = send(&app, Method::POST, "/api/simulation/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["state"], "running");
    assert_eq!(body["data"]["all_routes"], true);

    let (status, body) = send(&app, Method::POST, "/api/simulation/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "stopped");
}

#[tokio::test]
async fn test_route_scoped_start_on_missing_route_is_404() {
    let app = create_test_app().await;
    let (status, body) = send(&app, Method::POST, "/api/simulation/start?route_id=99", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_non_positive_route_id_is_rejected() {
    let app = create_test_app().await;
    let (status, _) = send(&app, Method::POST, "/api/simulation/restart?route_id=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assign_route_endpoint() {
    let app = create_test_app().await;
    let mut observer = app.events.subscribe();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/simulation/assign",
        Some(json!({ "vehicle_id": 2, "route_id": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["vehicle_id"], 2);
    assert_eq!(body["data"]["route_id"], 1);
    assert_eq!(body["data"]["current_index"], 0);
    assert_eq!(body["data"]["waypoint_count"], 2);
    assert_eq!(app.store.vehicle(2).unwrap().route_id, Some(1));
    assert_eq!(
        observer.recv().await.unwrap(),
        SimulationEvent::RouteChanged { vehicle_id: 2, route_id: 1 }
    );
}

#[tokio::test]
async fn test_assign_route_validation() {
    let app = create_test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/simulation/assign",
        Some(json!({ "vehicle_id": 0, "route_id": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_active_vehicles_lists_fleet() {
    let app = create_test_app().await;
    send(&app, Method::POST, "/api/simulation/start", None).await;

    let (status, body) = send(&app, Method::GET, "/api/simulation/active-vehicles", None).await;
    assert_eq!(status, StatusCode::OK);

    let vehicles = body.as_array().unwrap();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0]["vehicle_id"], 1);
    assert_eq!(vehicles[0]["advancing"], true);
}

#[tokio::test]
async fn test_list_routes_hides_disabled_unless_requested() {
    let app = create_test_app().await;

    let (_, enabled) = send(&app, Method::GET, "/api/routes", None).await;
    let ids: Vec<i64> = enabled.as_array().unwrap().iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(enabled[0]["waypoints"].as_array().unwrap().len(), 2);

    let (_, all) = send(&app, Method::GET, "/api/routes?all=true", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_route_visibility_endpoint() {
    let app = create_test_app().await;
    let mut observer = app.events.subscribe();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/routes/1/visibility",
        Some(json!({ "enabled": false })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], false);
    assert_eq!(
        observer.recv().await.unwrap(),
        SimulationEvent::RouteVisibilityChanged { route_id: 1, enabled: false }
    );

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/routes/77/visibility",
        Some(json!({ "enabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_route_endpoint() {
    let app = create_test_app().await;

    let (status, body) = send(&app, Method::DELETE, "/api/routes/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["detached_vehicles"], json!([1]));
    assert!(app.store.route(1).is_none());

    let (status, _) = send(&app, Method::DELETE, "/api/routes/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_vehicle_position_endpoint() {
    let app = create_test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/vehicles/1/position", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "waypoint");
    assert_eq!(body["latitude"], 42.24);

    app.engine.start(livebus::services::simulation::SimulationScope::All).await.unwrap();
    app.engine.tick().await;

    let (_, body) = send(&app, Method::GET, "/api/vehicles/1/position", None).await;
    assert_eq!(body["source"], "recorded");

    let (status, _) = send(&app, Method::GET, "/api/vehicles/2/position", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = create_test_app().await;
    livebus::services::simulation::metrics::register_metrics();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("livebus_fleet_size"));
}
