//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación. El motor de
//! simulación coordina el temporizador, la flota en memoria, la persistencia
//! y la difusión de eventos.

pub mod simulation;

pub use simulation::*;
