//! LiveBus: simulación en vivo de la posición de una flota de autobuses
//!
//! Un temporizador avanza cada autobús por los puntos de su ruta, guarda la
//! posición en PostgreSQL y la difunde a los mapas conectados por WebSocket.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
