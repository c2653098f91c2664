//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean al schema PostgreSQL.

pub mod position;
pub mod route;
pub mod vehicle;

pub use position::{NewPosition, Position};
pub use route::{Route, RouteWithWaypoints, Waypoint};
pub use vehicle::{Vehicle, VehicleWithRoute};
