//! Modelo de Position
//!
//! Historial de posiciones, solo se añaden registros.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Posición registrada - mapea a la tabla positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Position {
    pub id: i32,
    pub vehicle_id: i32,
    pub latitude: f64,
    pub longitude: f64,
    /// Hora local de la zona de referencia
    pub recorded_at: Option<NaiveDateTime>,
}

/// Posición pendiente de guardar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPosition {
    pub vehicle_id: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: NaiveDateTime,
}
