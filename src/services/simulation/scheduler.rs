//! Temporizador de ticks de la simulación
//!
//! Máquina de estados `Stopped` / `Running` con un único temporizador que se
//! desarma al disparar. El bucle de ticks lo vuelve a armar con `rearm_after_tick`
//! solo cuando el tick ha terminado, así nunca hay dos ticks en vuelo.
//!
//! Las operaciones globales y por ruta comparten el mismo código mediante
//! [`SimulationScope`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Alcance de una operación de control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "route_id")]
pub enum SimulationScope {
    All,
    Route(i32),
}

impl SimulationScope {
    pub fn from_route(route_id: Option<i32>) -> Self {
        route_id.map(SimulationScope::Route).unwrap_or(SimulationScope::All)
    }

    pub fn route_id(&self) -> Option<i32> {
        match self {
            SimulationScope::All => None,
            SimulationScope::Route(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Stopped,
    Running,
}

#[derive(Debug)]
struct Inner {
    state: SchedulerState,
    /// Modo global: todas las rutas sin marca explícita se consideran activas
    all_routes: bool,
    /// Marcas explícitas por ruta; tienen prioridad sobre el modo global
    routes: HashMap<i32, bool>,
    next_fire: Option<Instant>,
}

impl Inner {
    fn any_route_active(&self) -> bool {
        self.all_routes || self.routes.values().any(|active| *active)
    }

    fn route_active(&self, route_id: i32) -> bool {
        self.routes.get(&route_id).copied().unwrap_or(self.all_routes)
    }
}

/// Estado observable del temporizador
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub all_routes: bool,
    pub active_routes: Vec<i32>,
    pub paused_routes: Vec<i32>,
}

#[derive(Debug)]
pub struct TickScheduler {
    inner: Mutex<Inner>,
    wake: Notify,
    interval: Duration,
}

impl TickScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SchedulerState::Stopped,
                all_routes: false,
                routes: HashMap::new(),
                next_fire: None,
            }),
            wake: Notify::new(),
            interval,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Ninguna sección crítica puede dejar el estado a medias
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        self.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// La ruta debe avanzar en el próximo tick
    pub fn is_route_active(&self, route_id: i32) -> bool {
        let inner = self.lock();
        inner.state == SchedulerState::Running && inner.route_active(route_id)
    }

    pub fn status(&self) -> SchedulerStatus {
        let inner = self.lock();
        let mut active_routes: Vec<i32> = inner.routes.iter().filter(|(_, a)| **a).map(|(id, _)| *id).collect();
        let mut paused_routes: Vec<i32> = inner.routes.iter().filter(|(_, a)| !**a).map(|(id, _)| *id).collect();
        active_routes.sort_unstable();
        paused_routes.sort_unstable();
        SchedulerStatus {
            state: inner.state,
            all_routes: inner.all_routes,
            active_routes,
            paused_routes,
        }
    }

    /// Activar el alcance. Si el temporizador estaba parado, arranca sin retardo.
    /// Devuelve `true` si hubo transición `Stopped` → `Running`.
    pub fn start(&self, scope: SimulationScope) -> bool {
        let mut inner = self.lock();
        match scope {
            SimulationScope::All => {
                inner.all_routes = true;
                inner.routes.clear();
            }
            SimulationScope::Route(id) => {
                inner.routes.insert(id, true);
            }
        }
        self.transition_to_running(&mut inner)
    }

    /// Desactivar el alcance. Si no queda ninguna ruta activa, el temporizador se para.
    /// Devuelve `true` si hubo transición `Running` → `Stopped`.
    pub fn pause(&self, scope: SimulationScope) -> bool {
        let mut inner = self.lock();
        match scope {
            SimulationScope::All => {
                inner.all_routes = false;
                inner.routes.clear();
            }
            SimulationScope::Route(id) => {
                inner.routes.insert(id, false);
            }
        }

        if !inner.any_route_active() && inner.state == SchedulerState::Running {
            inner.state = SchedulerState::Stopped;
            inner.next_fire = None;
            drop(inner);
            self.wake.notify_one();
            return true;
        }
        false
    }

    /// Pausa seguida de arranque. Para el alcance global el temporizador siempre
    /// vuelve a disparar de inmediato.
    pub fn restart(&self, scope: SimulationScope) {
        match scope {
            SimulationScope::All => {
                self.pause(SimulationScope::All);
                self.start(SimulationScope::All);
            }
            SimulationScope::Route(_) => {
                self.start(scope);
            }
        }
    }

    fn transition_to_running(&self, inner: &mut MutexGuard<'_, Inner>) -> bool {
        if inner.state == SchedulerState::Running {
            return false;
        }
        inner.state = SchedulerState::Running;
        inner.next_fire = Some(Instant::now());
        self.wake.notify_one();
        true
    }

    /// Volver a armar tras un tick, solo si el motor sigue en marcha y nadie
    /// lo armó mientras tanto.
    pub fn rearm_after_tick(&self) {
        let mut inner = self.lock();
        if inner.state == SchedulerState::Running && inner.next_fire.is_none() {
            inner.next_fire = Some(Instant::now() + self.interval);
            drop(inner);
            self.wake.notify_one();
        }
    }

    /// Desarmar definitivamente (apagado del motor)
    pub fn disarm(&self) {
        let mut inner = self.lock();
        inner.state = SchedulerState::Stopped;
        inner.next_fire = None;
        drop(inner);
        self.wake.notify_one();
    }

    /// Esperar al próximo disparo. Al devolver `true` el temporizador queda
    /// desarmado; `false` indica cancelación.
    pub async fn wait_for_fire(&self, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }

            let deadline = self.lock().next_fire;
            match deadline {
                None => {
                    tokio::select! {
                        _ = cancel.cancelled() => return false,
                        _ = self.wake.notified() => continue,
                    }
                }
                Some(at) => {
                    tokio::select! {
                        _ = cancel.cancelled() => return false,
                        _ = self.wake.notified() => continue,
                        _ = tokio::time::sleep_until(at) => {
                            let mut inner = self.lock();
                            if inner.state == SchedulerState::Running && inner.next_fire == Some(at) {
                                inner.next_fire = None;
                                return true;
                            }
                        }
                    }
                }
            }
        }
    }
}
