//! Controladores
//!
//! Lógica de cada grupo de endpoints, independiente de axum.

pub mod route_controller;
pub mod simulation_controller;
pub mod vehicle_controller;
