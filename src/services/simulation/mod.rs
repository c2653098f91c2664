//! Simulación de posiciones en vivo
//!
//! El temporizador avanza la flota sobre sus rutas, guarda cada posición y la
//! difunde a los observadores conectados.

pub mod advancer;
pub mod engine;
pub mod events;
pub mod fleet_registry;
pub mod metrics;
pub mod scheduler;
pub mod store;

pub use engine::{CurrentPosition, EngineStatus, PositionSource, SimulationEngine, TickReport};
pub use events::{BroadcastPublisher, EventPublisher, SimulationEvent};
pub use fleet_registry::{FleetEntry, FleetRegistry, RouteSnapshot};
pub use scheduler::{SchedulerState, SchedulerStatus, SimulationScope, TickScheduler};
pub use store::{PgSimulationStore, SimulationStore};
