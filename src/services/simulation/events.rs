//! Eventos difundidos a los observadores
//!
//! La difusión es de tipo "fire-and-forget": un fallo se registra y nunca se
//! propaga al tick ni a las operaciones de control.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Evento de la simulación, serializado como `{"event": "<nombre>", ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SimulationEvent {
    #[serde(rename_all = "camelCase")]
    PositionUpdated { vehicle_id: i32, latitude: f64, longitude: f64 },

    #[serde(rename_all = "camelCase")]
    RouteChanged { vehicle_id: i32, route_id: i32 },

    #[serde(rename_all = "camelCase")]
    RouteVisibilityChanged { route_id: i32, enabled: bool },

    #[serde(rename_all = "camelCase")]
    RouteDeleted { route_id: i32 },

    SimulationStarted,
    SimulationPaused,
    SimulationRestarted,

    #[serde(rename_all = "camelCase")]
    SimulationStartedRoute { route_id: i32 },

    #[serde(rename_all = "camelCase")]
    SimulationPausedRoute { route_id: i32 },

    #[serde(rename_all = "camelCase")]
    SimulationRestartedRoute { route_id: i32 },
}

impl SimulationEvent {
    /// Nombre del evento tal como lo ven los clientes
    pub fn name(&self) -> &'static str {
        match self {
            SimulationEvent::PositionUpdated { .. } => "positionUpdated",
            SimulationEvent::RouteChanged { .. } => "routeChanged",
            SimulationEvent::RouteVisibilityChanged { .. } => "routeVisibilityChanged",
            SimulationEvent::RouteDeleted { .. } => "routeDeleted",
            SimulationEvent::SimulationStarted => "simulationStarted",
            SimulationEvent::SimulationPaused => "simulationPaused",
            SimulationEvent::SimulationRestarted => "simulationRestarted",
            SimulationEvent::SimulationStartedRoute { .. } => "simulationStartedRoute",
            SimulationEvent::SimulationPausedRoute { .. } => "simulationPausedRoute",
            SimulationEvent::SimulationRestartedRoute { .. } => "simulationRestartedRoute",
        }
    }
}

/// Canal de difusión hacia los observadores
pub trait EventPublisher: Send + Sync {
    /// Enviar sin esperar confirmación de entrega
    fn publish(&self, event: SimulationEvent);
}

/// Publicador sobre `tokio::sync::broadcast`: cada observador tiene su propio
/// receptor y uno lento solo se pierde mensajes a sí mismo.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<SimulationEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: SimulationEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!("📡 Evento {} enviado a {} observadores", name, receivers),
            Err(_) => debug!("📡 Evento {} sin observadores conectados", name),
        }
    }
}
