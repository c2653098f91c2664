//! Utilidades compartidas por los tests de integración

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use livebus::config::SimulationConfig;
use livebus::models::{NewPosition, Position, Route, Vehicle, VehicleWithRoute, Waypoint};
use livebus::services::simulation::{EventPublisher, SimulationEngine, SimulationEvent, SimulationStore};
use livebus::models::RouteWithWaypoints;
use livebus::utils::errors::StoreError;

#[derive(Default)]
struct StoreState {
    routes: BTreeMap<i32, Route>,
    waypoints: Vec<Waypoint>,
    vehicles: BTreeMap<i32, Vehicle>,
    positions: Vec<Position>,
    fail_positions_for: Vec<i32>,
}

/// Punto de parada para intercalar operaciones concurrentes en los tests.
/// Cuando está armado, la primera llamada a `pass` avisa y espera a `release`.
#[derive(Default)]
pub struct Gate {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

/// Persistencia en memoria con inyección de fallos por vehículo
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    /// Vehículo cuyo próximo `record_advance` entra en pánico (0 = ninguno)
    panic_next_advance_of: Arc<AtomicI32>,
    pub advance_gate: Arc<Gate>,
    pub update_gate: Arc<Gate>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Añadir una ruta con sus puntos `(lat, lon)` en orden
    pub fn add_route(&self, id: i32, enabled: bool, points: &[(f64, f64)]) {
        let mut state = self.state.lock().unwrap();
        state.routes.insert(
            id,
            Route {
                id,
                description: format!("Ruta {}", id),
                enabled,
            },
        );
        for (i, (lat, lon)) in points.iter().enumerate() {
            let waypoint_id = state.waypoints.len() as i32 + 1;
            state.waypoints.push(Waypoint {
                id: waypoint_id,
                route_id: id,
                order_index: i as i32,
                latitude: *lat,
                longitude: *lon,
            });
        }
    }

    pub fn add_vehicle(&self, id: i32, route_id: Option<i32>) {
        self.state.lock().unwrap().vehicles.insert(
            id,
            Vehicle {
                id,
                name: Some(format!("Bus {}", id)),
                status: Some("en servicio".to_string()),
                route_id,
                waypoint_index: 0,
            },
        );
    }

    pub fn panic_next_advance_of(&self, vehicle_id: i32) {
        self.panic_next_advance_of.store(vehicle_id, Ordering::SeqCst);
    }

    /// Cambiar la ruta de un vehículo sin pasar por el motor
    pub fn set_vehicle_route(&self, vehicle_id: i32, route_id: Option<i32>) {
        if let Some(vehicle) = self.state.lock().unwrap().vehicles.get_mut(&vehicle_id) {
            vehicle.route_id = route_id;
            vehicle.waypoint_index = 0;
        }
    }

    pub fn fail_positions_for(&self, vehicle_id: i32) {
        self.state.lock().unwrap().fail_positions_for.push(vehicle_id);
    }

    pub fn positions_for(&self, vehicle_id: i32) -> Vec<Position> {
        self.state
            .lock()
            .unwrap()
            .positions
            .iter()
            .filter(|p| p.vehicle_id == vehicle_id)
            .cloned()
            .collect()
    }

    pub fn vehicle(&self, id: i32) -> Option<Vehicle> {
        self.state.lock().unwrap().vehicles.get(&id).cloned()
    }

    pub fn route(&self, id: i32) -> Option<Route> {
        self.state.lock().unwrap().routes.get(&id).cloned()
    }

    pub fn waypoint_count(&self, route_id: i32) -> usize {
        self.state.lock().unwrap().waypoints.iter().filter(|w| w.route_id == route_id).count()
    }

    fn sorted_waypoints(state: &StoreState, route_id: i32) -> Vec<Waypoint> {
        let mut points: Vec<Waypoint> = state.waypoints.iter().filter(|w| w.route_id == route_id).cloned().collect();
        points.sort_by_key(|w| w.order_index);
        points
    }
}

#[async_trait]
impl SimulationStore for InMemoryStore {
    async fn get_vehicle(&self, id: i32) -> Result<Option<Vehicle>, StoreError> {
        Ok(self.vehicle(id))
    }

    async fn list_vehicles_with_routes_and_waypoints(&self) -> Result<Vec<VehicleWithRoute>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .vehicles
            .values()
            .map(|vehicle| {
                let route = vehicle.route_id.and_then(|id| state.routes.get(&id)).map(|route| {
                    RouteWithWaypoints::new(route.clone(), Self::sorted_waypoints(&state, route.id))
                });
                VehicleWithRoute {
                    vehicle: vehicle.clone(),
                    route,
                }
            })
            .collect())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<Vehicle, StoreError> {
        self.update_gate.pass().await;
        let mut state = self.state.lock().unwrap();
        if !state.vehicles.contains_key(&vehicle.id) {
            return Err(StoreError::not_found("Vehicle", vehicle.id));
        }
        state.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle.clone())
    }

    async fn get_route(&self, id: i32) -> Result<Option<Route>, StoreError> {
        Ok(self.route(id))
    }

    async fn list_routes(&self, enabled_only: bool) -> Result<Vec<Route>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .routes
            .values()
            .filter(|r| !enabled_only || r.enabled)
            .cloned()
            .collect())
    }

    async fn list_routes_with_waypoints(&self, enabled_only: bool) -> Result<Vec<RouteWithWaypoints>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .routes
            .values()
            .filter(|r| !enabled_only || r.enabled)
            .map(|route| RouteWithWaypoints::new(route.clone(), Self::sorted_waypoints(&state, route.id)))
            .collect())
    }

    async fn get_waypoints_for_route(&self, route_id: i32) -> Result<Vec<Waypoint>, StoreError> {
        Ok(Self::sorted_waypoints(&self.state.lock().unwrap(), route_id))
    }

    async fn set_route_enabled(&self, route_id: i32, enabled: bool) -> Result<Route, StoreError> {
        let mut state = self.state.lock().unwrap();
        let route = state
            .routes
            .get_mut(&route_id)
            .ok_or_else(|| StoreError::not_found("Route", route_id))?;
        route.enabled = enabled;
        Ok(route.clone())
    }

    async fn append_position(&self, position: &NewPosition) -> Result<Position, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_positions_for.contains(&position.vehicle_id) {
            return Err(StoreError::Unavailable(format!("rejected position for {}", position.vehicle_id)));
        }
        let created = Position {
            id: state.positions.len() as i32 + 1,
            vehicle_id: position.vehicle_id,
            latitude: position.latitude,
            longitude: position.longitude,
            recorded_at: Some(position.recorded_at),
        };
        state.positions.push(created.clone());
        Ok(created)
    }

    async fn record_advance(
        &self,
        position: &NewPosition,
        route_id: i32,
        waypoint_index: i32,
    ) -> Result<Option<Position>, StoreError> {
        self.advance_gate.pass().await;
        if self
            .panic_next_advance_of
            .compare_exchange(position.vehicle_id, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            panic!("injected failure for vehicle {}", position.vehicle_id);
        }

        let assigned = self
            .vehicle(position.vehicle_id)
            .map(|v| v.route_id == Some(route_id))
            .unwrap_or(false);
        if !assigned {
            return Ok(None);
        }

        let created = self.append_position(position).await?;
        if let Some(vehicle) = self.state.lock().unwrap().vehicles.get_mut(&position.vehicle_id) {
            vehicle.waypoint_index = waypoint_index;
        }
        Ok(Some(created))
    }

    async fn latest_position(&self, vehicle_id: i32) -> Result<Option<Position>, StoreError> {
        Ok(self.positions_for(vehicle_id).pop())
    }

    async fn delete_route(&self, route_id: i32) -> Result<Vec<i32>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.routes.remove(&route_id).is_none() {
            return Err(StoreError::not_found("Route", route_id));
        }
        state.waypoints.retain(|w| w.route_id != route_id);

        let mut detached = Vec::new();
        for vehicle in state.vehicles.values_mut() {
            if vehicle.route_id == Some(route_id) {
                vehicle.detach_route();
                detached.push(vehicle.id);
            }
        }
        Ok(detached)
    }
}

/// Publicador que guarda los eventos en orden
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<SimulationEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: SimulationEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn test_config() -> SimulationConfig {
    SimulationConfig {
        tick_interval: Duration::from_millis(50),
        ..SimulationConfig::default()
    }
}

/// Motor sobre la persistencia en memoria, con los datos iniciales ya cargados
pub async fn engine_with(store: &InMemoryStore, publisher: &RecordingPublisher) -> Arc<SimulationEngine> {
    let engine = Arc::new(SimulationEngine::new(
        Arc::new(store.clone()),
        Arc::new(publisher.clone()),
        test_config(),
    ));
    engine.load_initial_data().await.unwrap();
    engine
}

pub fn positions(events: &[SimulationEvent]) -> Vec<(i32, f64, f64)> {
    events
        .iter()
        .filter_map(|e| match e {
            SimulationEvent::PositionUpdated {
                vehicle_id,
                latitude,
                longitude,
            } => Some((*vehicle_id, *latitude, *longitude)),
            _ => None,
        })
        .collect()
}
