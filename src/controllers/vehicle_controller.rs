use crate::services::simulation::{CurrentPosition, SimulationEngine};
use crate::utils::errors::AppError;
use std::sync::Arc;

pub struct VehicleController {
    engine: Arc<SimulationEngine>,
}

impl VehicleController {
    pub fn new(engine: Arc<SimulationEngine>) -> Self {
        Self { engine }
    }

    pub async fn current_position(&self, vehicle_id: i32) -> Result<CurrentPosition, AppError> {
        self.engine.current_position(vehicle_id).await
    }
}
