//! Configuración del motor de simulación

use chrono::{FixedOffset, Offset, Utc};
use std::time::Duration;

use super::{env_or, ConfigError};

/// Parámetros del motor de simulación
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Intervalo entre ticks
    pub tick_interval: Duration,
    /// Zona horaria de referencia para los timestamps de las posiciones
    pub reference_offset: FixedOffset,
    /// Capacidad del canal de difusión hacia los observadores
    pub event_capacity: usize,
    /// Arrancar la simulación global al iniciar el servicio
    pub autostart: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(3),
            // Hora central europea
            reference_offset: FixedOffset::east_opt(3600).unwrap_or_else(|| Utc.fix()),
            event_capacity: 256,
            autostart: false,
        }
    }
}

impl SimulationConfig {
    /// Cargar la configuración desde las variables de entorno
    pub fn from_env() -> Result<Self, ConfigError> {
        let tick_ms: u64 = env_or("SIMULATION_TICK_INTERVAL_MS", 3000)?;
        if tick_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "SIMULATION_TICK_INTERVAL_MS",
                value: tick_ms.to_string(),
            });
        }

        let offset_minutes: i32 = env_or("SIMULATION_UTC_OFFSET_MINUTES", 60)?;
        let reference_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or(ConfigError::Invalid {
            name: "SIMULATION_UTC_OFFSET_MINUTES",
            value: offset_minutes.to_string(),
        })?;

        let event_capacity: usize = env_or("SIMULATION_EVENT_CAPACITY", 256)?;
        if event_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "SIMULATION_EVENT_CAPACITY",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            tick_interval: Duration::from_millis(tick_ms),
            reference_offset,
            event_capacity,
            autostart: env_or("SIMULATION_AUTOSTART", false)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ticks_every_three_seconds() {
        let config = SimulationConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(3));
        assert_eq!(config.reference_offset.local_minus_utc(), 3600);
        assert!(!config.autostart);
    }
}
