//! Registro en memoria de la flota simulada
//!
//! Fuente de verdad que muta el bucle de ticks. Cada entrada guarda una copia
//! de la ruta asignada (compartida entre los vehículos de la misma ruta) y el
//! índice del punto actual. Las entradas se reemplazan enteras, nunca campo a
//! campo, para que un tick concurrente vea la asignación vieja o la nueva.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Route, RouteWithWaypoints, Vehicle, VehicleWithRoute, Waypoint};

/// Copia inmutable de una ruta y sus puntos ordenados
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSnapshot {
    pub route: Route,
    pub waypoints: Arc<[Waypoint]>,
}

impl RouteSnapshot {
    pub fn id(&self) -> i32 {
        self.route.id
    }

    pub fn is_enabled(&self) -> bool {
        self.route.enabled
    }

    fn with_enabled(&self, enabled: bool) -> Self {
        let mut route = self.route.clone();
        route.enabled = enabled;
        Self {
            route,
            waypoints: Arc::clone(&self.waypoints),
        }
    }
}

impl From<RouteWithWaypoints> for RouteSnapshot {
    fn from(full: RouteWithWaypoints) -> Self {
        let RouteWithWaypoints { route, mut waypoints } = full;
        waypoints.sort_by_key(|w| w.order_index);
        Self {
            route,
            waypoints: waypoints.into(),
        }
    }
}

/// Estado de simulación de un vehículo
#[derive(Debug, Clone)]
pub struct FleetEntry {
    pub vehicle_id: i32,
    pub name: Option<String>,
    pub status: Option<String>,
    pub route: Option<Arc<RouteSnapshot>>,
    pub current_index: usize,
    /// Cambia con cada mutación fuera del tick (reemplazo, reinicio, desasignación)
    pub revision: u64,
}

impl FleetEntry {
    pub fn new(vehicle: &Vehicle, route: Option<Arc<RouteSnapshot>>) -> Self {
        Self {
            vehicle_id: vehicle.id,
            name: vehicle.name.clone(),
            status: vehicle.status.clone(),
            route,
            current_index: usize::try_from(vehicle.waypoint_index).unwrap_or(0),
            revision: 0,
        }
    }

    pub fn route_id(&self) -> Option<i32> {
        self.route.as_ref().map(|r| r.id())
    }

    /// Tiene ruta habilitada con al menos un punto
    pub fn is_advanceable(&self) -> bool {
        self.route
            .as_ref()
            .map(|r| r.is_enabled() && !r.waypoints.is_empty())
            .unwrap_or(false)
    }
}

/// Mapa concurrente vehicle-id → estado de simulación
#[derive(Debug, Default)]
pub struct FleetRegistry {
    entries: RwLock<HashMap<i32, FleetEntry>>,
    revisions: AtomicU64,
}

impl FleetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_revision(&self) -> u64 {
        self.revisions.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Cargar (o fusionar) vehículos con sus rutas. Los vehículos de una misma
    /// ruta comparten la misma copia. Devuelve cuántas entradas se cargaron.
    pub async fn load(&self, vehicles: Vec<VehicleWithRoute>) -> usize {
        let mut routes: HashMap<i32, Arc<RouteSnapshot>> = HashMap::new();
        let mut loaded = Vec::with_capacity(vehicles.len());

        for VehicleWithRoute { vehicle, route } in vehicles {
            let snapshot = route.map(|full| {
                Arc::clone(
                    routes
                        .entry(full.route.id)
                        .or_insert_with(|| Arc::new(RouteSnapshot::from(full))),
                )
            });
            let mut entry = FleetEntry::new(&vehicle, snapshot);
            entry.revision = self.next_revision();
            loaded.push(entry);
        }

        let count = loaded.len();
        let mut entries = self.entries.write().await;
        for entry in loaded {
            entries.insert(entry.vehicle_id, entry);
        }
        count
    }

    /// Insertar o reemplazar una entrada completa
    pub async fn upsert(&self, mut entry: FleetEntry) {
        entry.revision = self.next_revision();
        self.entries.write().await.insert(entry.vehicle_id, entry);
    }

    /// Copia de todas las entradas, ordenada por vehículo
    pub async fn snapshot(&self) -> Vec<FleetEntry> {
        let mut copy: Vec<FleetEntry> = self.entries.read().await.values().cloned().collect();
        copy.sort_by_key(|e| e.vehicle_id);
        copy
    }

    pub async fn get(&self, vehicle_id: i32) -> Option<FleetEntry> {
        self.entries.read().await.get(&vehicle_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Poner a 0 el índice de todas las entradas que cumplan el predicado
    pub async fn reset_index<F>(&self, predicate: F) -> usize
    where
        F: Fn(&FleetEntry) -> bool,
    {
        let mut entries = self.entries.write().await;
        let mut reset = 0;
        for entry in entries.values_mut().filter(|e| predicate(e)) {
            entry.current_index = 0;
            entry.revision = self.next_revision();
            reset += 1;
        }
        reset
    }

    /// Guardar el resultado de un tick solo si la entrada no cambió desde la copia
    pub async fn commit_index(&self, vehicle_id: i32, revision: u64, new_index: usize) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&vehicle_id) {
            Some(entry) if entry.revision == revision => {
                entry.current_index = new_index;
                true
            }
            _ => false,
        }
    }

    /// Sincronizar el estado habilitado de una ruta en las copias cacheadas
    pub async fn set_route_enabled(&self, route_id: i32, enabled: bool) -> usize {
        let mut entries = self.entries.write().await;
        let mut replacement: Option<Arc<RouteSnapshot>> = None;
        let mut updated = 0;

        for entry in entries.values_mut() {
            let Some(current) = entry.route.as_ref().filter(|r| r.id() == route_id) else {
                continue;
            };
            let snapshot = replacement
                .get_or_insert_with(|| Arc::new(current.with_enabled(enabled)))
                .clone();
            entry.route = Some(snapshot);
            updated += 1;
        }
        updated
    }

    /// Sustituir la copia de una ruta (p. ej. tras cambiar sus puntos)
    pub async fn replace_route(&self, snapshot: RouteSnapshot) -> usize {
        let route_id = snapshot.id();
        let snapshot = Arc::new(snapshot);
        let mut entries = self.entries.write().await;
        let mut updated = 0;

        for entry in entries.values_mut().filter(|e| e.route_id() == Some(route_id)) {
            entry.route = Some(Arc::clone(&snapshot));
            updated += 1;
        }
        updated
    }

    /// Desasignar la ruta de todos sus vehículos. Devuelve los vehículos afectados.
    pub async fn detach_route(&self, route_id: i32) -> Vec<i32> {
        let mut entries = self.entries.write().await;
        let mut detached = Vec::new();

        for entry in entries.values_mut().filter(|e| e.route_id() == Some(route_id)) {
            entry.route = None;
            entry.current_index = 0;
            entry.revision = self.next_revision();
            detached.push(entry.vehicle_id);
        }
        detached.sort_unstable();
        detached
    }
}
