//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos, variables de entorno
//! y parámetros del motor de simulación.

pub mod database;
pub mod environment;
pub mod simulation;

pub use database::DatabaseConfig;
pub use environment::*;
pub use simulation::SimulationConfig;

use thiserror::Error;

/// Errores al leer la configuración del entorno
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Leer una variable de entorno y parsearla, usando un valor por defecto si no existe
pub(crate) fn env_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
