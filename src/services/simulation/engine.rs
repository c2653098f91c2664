//! Motor de simulación de posiciones en vivo
//!
//! Une el temporizador, el registro de la flota, la persistencia y la difusión.
//! Un único task de tokio ejecuta los ticks; las operaciones de control llegan
//! en paralelo desde los handlers HTTP.

use chrono::{NaiveDateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::advancer;
use super::events::{EventPublisher, SimulationEvent};
use super::fleet_registry::{FleetEntry, FleetRegistry, RouteSnapshot};
use super::metrics;
use super::scheduler::{SchedulerStatus, SimulationScope, TickScheduler};
use super::store::SimulationStore;
use crate::config::SimulationConfig;
use crate::models::{NewPosition, Route, RouteWithWaypoints};
use crate::utils::errors::{not_found_error, AppError, AppResult, StoreError};

/// Resumen de un tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub advanced: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Estado del motor para la API de administración
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    #[serde(flatten)]
    pub scheduler: SchedulerStatus,
    pub fleet_size: usize,
    pub tick_interval_ms: u64,
}

/// De dónde sale la posición actual de un vehículo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    Recorded,
    Waypoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentPosition {
    pub vehicle_id: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: Option<NaiveDateTime>,
    pub source: PositionSource,
}

pub struct SimulationEngine {
    store: Arc<dyn SimulationStore>,
    publisher: Arc<dyn EventPublisher>,
    registry: FleetRegistry,
    scheduler: TickScheduler,
    config: SimulationConfig,
    cancel: CancellationToken,
    /// Un tick y las mutaciones de la flota (asignar, reiniciar, visibilidad,
    /// recargar, eliminar) nunca se solapan
    tick_lock: tokio::sync::Mutex<()>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl SimulationEngine {
    pub fn new(
        store: Arc<dyn SimulationStore>,
        publisher: Arc<dyn EventPublisher>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            registry: FleetRegistry::new(),
            scheduler: TickScheduler::new(config.tick_interval),
            config,
            cancel: CancellationToken::new(),
            tick_lock: tokio::sync::Mutex::new(()),
            driver: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &FleetRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Cargar en el registro todos los vehículos con ruta no vacía
    pub async fn load_initial_data(&self) -> Result<usize, StoreError> {
        let vehicles: Vec<_> = self
            .store
            .list_vehicles_with_routes_and_waypoints()
            .await?
            .into_iter()
            .filter(|v| v.route.as_ref().map(|r| !r.waypoints.is_empty()).unwrap_or(false))
            .collect();

        let loaded = self.registry.load(vehicles).await;
        metrics::FLEET_SIZE.set(self.registry.len().await as i64);
        info!("🚌 Datos iniciales cargados: {} autobuses activos", loaded);
        Ok(loaded)
    }

    /// Lanzar el task del temporizador
    pub fn spawn(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move { engine.run_loop().await });

        let mut driver = self.driver.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = driver.replace(handle) {
            warn!("⚠️ El temporizador ya estaba lanzado, se sustituye");
            previous.abort();
        }
    }

    async fn run_loop(self: Arc<Self>) {
        info!("⏱️ Servicio de simulación iniciado (intervalo {:?})", self.config.tick_interval);

        while self.scheduler.wait_for_fire(&self.cancel).await {
            // El tick corre en su propio task: un pánico no se lleva el bucle
            let engine = Arc::clone(&self);
            match tokio::spawn(async move { engine.tick().await }).await {
                Ok(report) => debug!(
                    "⏱️ Tick completado: {} avanzados, {} omitidos, {} fallidos",
                    report.advanced, report.skipped, report.failed
                ),
                Err(e) => {
                    metrics::TICK_PANICS_TOTAL.inc();
                    error!("❌ Error al actualizar posiciones de autobuses: {}", e);
                }
            }
            self.scheduler.rearm_after_tick();
        }

        info!("🛑 Servicio de simulación detenido");
    }

    /// Ejecutar un tick sobre todos los vehículos activos
    pub async fn tick(&self) -> TickReport {
        let _guard = self.tick_lock.lock().await;
        let started = Instant::now();
        let mut report = TickReport::default();

        for entry in self.registry.snapshot().await {
            let Some(route_id) = entry.route_id() else {
                report.skipped += 1;
                continue;
            };
            if !entry.is_advanceable() || !self.scheduler.is_route_active(route_id) {
                report.skipped += 1;
                continue;
            }

            // Un pánico en un vehículo no se lleva al resto del tick
            match AssertUnwindSafe(self.advance_vehicle(&entry)).catch_unwind().await {
                Ok(Ok(true)) => report.advanced += 1,
                Ok(Ok(false)) => report.skipped += 1,
                Ok(Err(e)) => {
                    metrics::VEHICLE_FAILURES_TOTAL.inc();
                    error!("❌ Error guardando la posición del autobús {}: {}", entry.vehicle_id, e);
                    report.failed += 1;
                }
                Err(_) => {
                    metrics::VEHICLE_FAILURES_TOTAL.inc();
                    error!("❌ Pánico al actualizar la posición del autobús {}", entry.vehicle_id);
                    report.failed += 1;
                }
            }
        }

        metrics::TICKS_TOTAL.inc();
        metrics::TICK_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());
        report
    }

    async fn advance_vehicle(&self, entry: &FleetEntry) -> Result<bool, StoreError> {
        let Some(route) = entry.route.as_ref() else {
            return Ok(false);
        };
        let Some(step) = advancer::advance(entry.current_index, &route.waypoints) else {
            return Ok(false);
        };

        let position = NewPosition {
            vehicle_id: entry.vehicle_id,
            latitude: step.latitude,
            longitude: step.longitude,
            recorded_at: self.local_now(),
        };
        let new_index = i32::try_from(step.new_index).unwrap_or(0);
        if self.store.record_advance(&position, route.id(), new_index).await?.is_none() {
            debug!("🔄 Autobús {} ya no está en la ruta {}, se omite", entry.vehicle_id, route.id());
            return Ok(false);
        }
        metrics::POSITIONS_RECORDED_TOTAL.inc();

        if !self.registry.commit_index(entry.vehicle_id, entry.revision, step.new_index).await {
            debug!("🔄 Autobús {} modificado durante el tick, se conserva el nuevo estado", entry.vehicle_id);
        }

        self.publisher.publish(SimulationEvent::PositionUpdated {
            vehicle_id: entry.vehicle_id,
            latitude: position.latitude,
            longitude: position.longitude,
        });
        Ok(true)
    }

    fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.config.reference_offset).naive_local()
    }

    async fn ensure_route_exists(&self, scope: SimulationScope) -> AppResult<()> {
        if let SimulationScope::Route(route_id) = scope {
            if self.store.get_route(route_id).await?.is_none() {
                return Err(not_found_error("Route", route_id));
            }
        }
        Ok(())
    }

    pub async fn start(&self, scope: SimulationScope) -> AppResult<EngineStatus> {
        self.ensure_route_exists(scope).await?;

        if self.scheduler.start(scope) {
            info!("▶️ Temporizador en marcha");
        }
        match scope {
            SimulationScope::All => {
                info!("▶️ Simulación iniciada para todas las rutas habilitadas");
                self.publisher.publish(SimulationEvent::SimulationStarted);
            }
            SimulationScope::Route(route_id) => {
                info!("▶️ Simulación iniciada para la ruta {}", route_id);
                self.publisher.publish(SimulationEvent::SimulationStartedRoute { route_id });
            }
        }
        Ok(self.status().await)
    }

    pub async fn pause(&self, scope: SimulationScope) -> AppResult<EngineStatus> {
        self.ensure_route_exists(scope).await?;

        if self.scheduler.pause(scope) {
            info!("⏸️ Temporizador detenido: no quedan rutas activas");
        }
        match scope {
            SimulationScope::All => {
                info!("⏸️ Simulación pausada para todas las rutas habilitadas");
                self.publisher.publish(SimulationEvent::SimulationPaused);
            }
            SimulationScope::Route(route_id) => {
                info!("⏸️ Simulación pausada para la ruta {}", route_id);
                self.publisher.publish(SimulationEvent::SimulationPausedRoute { route_id });
            }
        }
        Ok(self.status().await)
    }

    /// Reiniciar: vuelve a 0 el punto actual de los vehículos del alcance y arranca
    pub async fn restart(&self, scope: SimulationScope) -> AppResult<EngineStatus> {
        self.ensure_route_exists(scope).await?;
        let _guard = self.tick_lock.lock().await;

        let reset = match scope {
            SimulationScope::All => self.registry.reset_index(|_| true).await,
            SimulationScope::Route(route_id) => {
                self.registry.reset_index(|e| e.route_id() == Some(route_id)).await
            }
        };
        self.scheduler.restart(scope);

        match scope {
            SimulationScope::All => {
                info!("🔁 Simulación reiniciada para todas las rutas ({} autobuses)", reset);
                self.publisher.publish(SimulationEvent::SimulationRestarted);
            }
            SimulationScope::Route(route_id) => {
                info!("🔁 Simulación reiniciada para la ruta {} ({} autobuses)", route_id, reset);
                self.publisher.publish(SimulationEvent::SimulationRestartedRoute { route_id });
            }
        }
        Ok(self.status().await)
    }

    /// Asignar una ruta a un vehículo. La entrada del registro se reemplaza entera.
    pub async fn assign_route(&self, vehicle_id: i32, route_id: i32) -> AppResult<FleetEntry> {
        let _guard = self.tick_lock.lock().await;
        let mut vehicle = self
            .store
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", vehicle_id))?;
        let route = self
            .store
            .get_route_with_waypoints(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", route_id))?;

        vehicle.assign_route(route_id);
        let updated = match self.store.update_vehicle(&vehicle).await {
            Ok(updated) => updated,
            Err(e) => {
                error!("❌ Error al asignar ruta {} al autobus {}: {}", route_id, vehicle_id, e);
                return Err(e.into());
            }
        };

        let snapshot = RouteSnapshot::from(route);
        self.registry.replace_route(snapshot.clone()).await;
        let entry = FleetEntry::new(&updated, Some(Arc::new(snapshot)));
        self.registry.upsert(entry).await;
        metrics::FLEET_SIZE.set(self.registry.len().await as i64);

        info!("🔀 Autobús {} asignado a la ruta {}", vehicle_id, route_id);
        self.publisher.publish(SimulationEvent::RouteChanged { vehicle_id, route_id });

        self.registry
            .get(vehicle_id)
            .await
            .ok_or_else(|| AppError::Internal(format!("fleet entry {} vanished", vehicle_id)))
    }

    /// Habilitar o deshabilitar una ruta: persistir, avisar a los observadores y
    /// pausar o reanudar su simulación.
    pub async fn set_route_visibility(&self, route_id: i32, enabled: bool) -> AppResult<Route> {
        let _guard = self.tick_lock.lock().await;
        let route = self.store.set_route_enabled(route_id, enabled).await?;
        let cached = self.registry.set_route_enabled(route_id, enabled).await;

        self.publisher.publish(SimulationEvent::RouteVisibilityChanged { route_id, enabled });

        if enabled {
            self.scheduler.start(SimulationScope::Route(route_id));
            self.publisher.publish(SimulationEvent::SimulationStartedRoute { route_id });
        } else {
            self.scheduler.pause(SimulationScope::Route(route_id));
            self.publisher.publish(SimulationEvent::SimulationPausedRoute { route_id });
        }

        info!(
            "👁️ Ruta {} {} ({} autobuses en el registro)",
            route_id,
            if enabled { "habilitada" } else { "deshabilitada" },
            cached
        );
        Ok(route)
    }

    /// Recargar los puntos de una ruta tras un cambio externo
    pub async fn reload_route(&self, route_id: i32) -> AppResult<RouteWithWaypoints> {
        let _guard = self.tick_lock.lock().await;
        let route = self
            .store
            .get_route_with_waypoints(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", route_id))?;

        let updated = self.registry.replace_route(RouteSnapshot::from(route.clone())).await;
        info!("🗺️ Ruta {} recargada: {} puntos, {} autobuses", route_id, route.waypoints.len(), updated);
        Ok(route)
    }

    /// Eliminar una ruta: sus puntos se borran y sus vehículos quedan sin ruta
    pub async fn delete_route(&self, route_id: i32) -> AppResult<Vec<i32>> {
        let _guard = self.tick_lock.lock().await;
        let detached = self.store.delete_route(route_id).await?;
        let cached = self.registry.detach_route(route_id).await;
        self.scheduler.pause(SimulationScope::Route(route_id));

        info!(
            "🗑️ Ruta {} eliminada: {} autobuses desasignados ({} en el registro)",
            route_id,
            detached.len(),
            cached.len()
        );
        self.publisher.publish(SimulationEvent::RouteDeleted { route_id });
        Ok(detached)
    }

    /// Copia del registro de la flota
    pub async fn active_vehicles(&self) -> Vec<FleetEntry> {
        self.registry.snapshot().await
    }

    /// El vehículo avanzará en el próximo tick
    pub fn is_advancing(&self, entry: &FleetEntry) -> bool {
        entry.is_advanceable()
            && entry
                .route_id()
                .map(|id| self.scheduler.is_route_active(id))
                .unwrap_or(false)
    }

    /// Posición actual: último registro o, si no hay, el punto actual de su ruta
    pub async fn current_position(&self, vehicle_id: i32) -> AppResult<CurrentPosition> {
        if let Some(recorded) = self.store.latest_position(vehicle_id).await? {
            return Ok(CurrentPosition {
                vehicle_id,
                latitude: recorded.latitude,
                longitude: recorded.longitude,
                recorded_at: recorded.recorded_at,
                source: PositionSource::Recorded,
            });
        }

        let vehicle = self
            .store
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", vehicle_id))?;
        let route_id = vehicle
            .route_id
            .ok_or_else(|| AppError::InvalidState(format!("Vehicle {} has no route and no positions", vehicle_id)))?;

        let waypoints = self.store.get_waypoints_for_route(route_id).await?;
        let index = usize::try_from(vehicle.waypoint_index).unwrap_or(0);
        let waypoint = waypoints
            .get(index)
            .or_else(|| waypoints.first())
            .ok_or_else(|| AppError::InvalidState(format!("Route {} has no waypoints", route_id)))?;

        Ok(CurrentPosition {
            vehicle_id,
            latitude: waypoint.latitude,
            longitude: waypoint.longitude,
            recorded_at: None,
            source: PositionSource::Waypoint,
        })
    }

    pub async fn status(&self) -> EngineStatus {
        EngineStatus {
            scheduler: self.scheduler.status(),
            fleet_size: self.registry.len().await,
            tick_interval_ms: self.config.tick_interval.as_millis() as u64,
        }
    }

    /// Apagado: primero se desarma el temporizador, luego se espera al tick en vuelo
    pub async fn shutdown(&self) {
        self.scheduler.disarm();
        self.cancel.cancel();

        let handle = self.driver.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("❌ El temporizador terminó con error: {}", e);
            }
        }

        // Un tick lanzado a mano también debe terminar
        let _guard = self.tick_lock.lock().await;
        info!("👋 Motor de simulación apagado");
    }
}
