//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::services::simulation::{BroadcastPublisher, SimulationEngine, SimulationStore};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub store: Arc<dyn SimulationStore>,
    pub engine: Arc<SimulationEngine>,
    pub events: BroadcastPublisher,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        store: Arc<dyn SimulationStore>,
        engine: Arc<SimulationEngine>,
        events: BroadcastPublisher,
    ) -> Self {
        Self {
            config,
            store,
            engine,
            events,
        }
    }
}
