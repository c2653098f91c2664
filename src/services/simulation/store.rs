//! Contrato de persistencia que consume el motor de simulación
//!
//! `PgSimulationStore` lo implementa sobre los repositorios de PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::models::{NewPosition, Position, Route, RouteWithWaypoints, Vehicle, VehicleWithRoute, Waypoint};
use crate::repositories::{PositionRepository, RouteRepository, VehicleRepository};
use crate::utils::errors::StoreError;

#[async_trait]
pub trait SimulationStore: Send + Sync {
    async fn get_vehicle(&self, id: i32) -> Result<Option<Vehicle>, StoreError>;

    /// Todos los vehículos, con su ruta y puntos ordenados cuando tienen ruta asignada
    async fn list_vehicles_with_routes_and_waypoints(&self) -> Result<Vec<VehicleWithRoute>, StoreError>;

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<Vehicle, StoreError>;

    async fn get_route(&self, id: i32) -> Result<Option<Route>, StoreError>;

    async fn list_routes(&self, enabled_only: bool) -> Result<Vec<Route>, StoreError>;

    /// Rutas con sus puntos ordenados, leyendo los puntos de todas en una sola consulta
    async fn list_routes_with_waypoints(&self, enabled_only: bool) -> Result<Vec<RouteWithWaypoints>, StoreError>;

    /// Puntos de la ruta ordenados por `order_index`
    async fn get_waypoints_for_route(&self, route_id: i32) -> Result<Vec<Waypoint>, StoreError>;

    async fn set_route_enabled(&self, route_id: i32, enabled: bool) -> Result<Route, StoreError>;

    async fn append_position(&self, position: &NewPosition) -> Result<Position, StoreError>;

    /// Registrar el avance de un vehículo: nueva posición y puntero actualizado.
    /// Devuelve `None` sin escribir nada si el vehículo ya no está en `route_id`.
    async fn record_advance(
        &self,
        position: &NewPosition,
        route_id: i32,
        waypoint_index: i32,
    ) -> Result<Option<Position>, StoreError>;

    async fn latest_position(&self, vehicle_id: i32) -> Result<Option<Position>, StoreError>;

    /// Eliminar ruta y puntos, desasignando sus vehículos. Devuelve los vehículos desasignados.
    async fn delete_route(&self, route_id: i32) -> Result<Vec<i32>, StoreError>;

    /// Ruta con sus puntos, o `None` si no existe
    async fn get_route_with_waypoints(&self, route_id: i32) -> Result<Option<RouteWithWaypoints>, StoreError> {
        let Some(route) = self.get_route(route_id).await? else {
            return Ok(None);
        };
        let waypoints = self.get_waypoints_for_route(route_id).await?;
        Ok(Some(RouteWithWaypoints::new(route, waypoints)))
    }
}

/// Implementación sobre PostgreSQL
#[derive(Clone)]
pub struct PgSimulationStore {
    pool: PgPool,
}

impl PgSimulationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn vehicles(&self) -> VehicleRepository {
        VehicleRepository::new(self.pool.clone())
    }

    fn routes(&self) -> RouteRepository {
        RouteRepository::new(self.pool.clone())
    }

    fn positions(&self) -> PositionRepository {
        PositionRepository::new(self.pool.clone())
    }
}

#[async_trait]
impl SimulationStore for PgSimulationStore {
    async fn get_vehicle(&self, id: i32) -> Result<Option<Vehicle>, StoreError> {
        self.vehicles().find_by_id(id).await
    }

    async fn list_vehicles_with_routes_and_waypoints(&self) -> Result<Vec<VehicleWithRoute>, StoreError> {
        let vehicles = self.vehicles().list_all().await?;
        let routes_by_id: HashMap<i32, RouteWithWaypoints> = self
            .list_routes_with_waypoints(false)
            .await?
            .into_iter()
            .map(|full| (full.route.id, full))
            .collect();

        Ok(vehicles
            .into_iter()
            .map(|vehicle| {
                let route = vehicle.route_id.and_then(|id| routes_by_id.get(&id).cloned());
                VehicleWithRoute { vehicle, route }
            })
            .collect())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<Vehicle, StoreError> {
        self.vehicles().update(vehicle).await
    }

    async fn get_route(&self, id: i32) -> Result<Option<Route>, StoreError> {
        self.routes().find_by_id(id).await
    }

    async fn list_routes(&self, enabled_only: bool) -> Result<Vec<Route>, StoreError> {
        self.routes().list(enabled_only).await
    }

    async fn list_routes_with_waypoints(&self, enabled_only: bool) -> Result<Vec<RouteWithWaypoints>, StoreError> {
        let routes = self.list_routes(enabled_only).await?;

        let route_ids: Vec<i32> = routes.iter().map(|r| r.id).collect();
        let mut waypoints_by_route: HashMap<i32, Vec<Waypoint>> = HashMap::new();
        for waypoint in self.routes().waypoints_for_routes(&route_ids).await? {
            waypoints_by_route.entry(waypoint.route_id).or_default().push(waypoint);
        }

        Ok(routes
            .into_iter()
            .map(|route| {
                let waypoints = waypoints_by_route.remove(&route.id).unwrap_or_default();
                RouteWithWaypoints::new(route, waypoints)
            })
            .collect())
    }

    async fn get_waypoints_for_route(&self, route_id: i32) -> Result<Vec<Waypoint>, StoreError> {
        self.routes().waypoints_for_route(route_id).await
    }

    async fn set_route_enabled(&self, route_id: i32, enabled: bool) -> Result<Route, StoreError> {
        self.routes().set_enabled(route_id, enabled).await
    }

    async fn append_position(&self, position: &NewPosition) -> Result<Position, StoreError> {
        let mut conn = self.pool.acquire().await?;
        PositionRepository::insert(&mut conn, position).await
    }

    async fn record_advance(
        &self,
        position: &NewPosition,
        route_id: i32,
        waypoint_index: i32,
    ) -> Result<Option<Position>, StoreError> {
        // Unidad de trabajo por vehículo: la conexión vuelve al pool al terminar
        let mut tx = self.pool.begin().await?;
        let still_assigned =
            VehicleRepository::update_waypoint_index(&mut tx, position.vehicle_id, route_id, waypoint_index).await?;
        if !still_assigned {
            tx.rollback().await?;
            return Ok(None);
        }
        let created = PositionRepository::insert(&mut tx, position).await?;
        tx.commit().await?;
        Ok(Some(created))
    }

    async fn latest_position(&self, vehicle_id: i32) -> Result<Option<Position>, StoreError> {
        self.positions().latest_for_vehicle(vehicle_id).await
    }

    async fn delete_route(&self, route_id: i32) -> Result<Vec<i32>, StoreError> {
        self.routes().delete_cascade(route_id).await
    }
}
