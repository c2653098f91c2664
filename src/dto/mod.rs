//! DTOs de la API

pub mod api_response;
pub mod route_dto;
pub mod simulation_dto;

pub use api_response::ApiResponse;
