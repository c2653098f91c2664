//! Repositorios
//!
//! Acceso a PostgreSQL por tabla.

pub mod position_repository;
pub mod route_repository;
pub mod vehicle_repository;

pub use position_repository::PositionRepository;
pub use route_repository::RouteRepository;
pub use vehicle_repository::VehicleRepository;
