//! Canal WebSocket para los observadores (mapas de los clientes)
//!
//! Cada conexión tiene su propio receptor del canal de difusión. Un cliente
//! lento pierde mensajes (`Lagged`) sin frenar a los demás ni al tick.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::services::simulation::SimulationEvent;
use crate::state::AppState;

pub fn create_observer_router() -> Router<AppState> {
    Router::new().route("/simulation", get(simulation_socket))
}

async fn simulation_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let receiver = state.events.subscribe();
    ws.on_upgrade(move |socket| forward_events(socket, receiver))
}

async fn forward_events(socket: WebSocket, mut receiver: tokio::sync::broadcast::Receiver<SimulationEvent>) {
    info!("🔌 Observador conectado");
    let (mut sender, mut incoming) = socket.split();

    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("⚠️ No se pudo serializar el evento {}: {}", event.name(), e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("⚠️ Observador lento, {} eventos perdidos", missed);
                }
                Err(RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => debug!("📨 Mensaje de observador ignorado"),
                Some(Err(e)) => {
                    debug!("🔌 Error en la conexión del observador: {}", e);
                    break;
                }
            },
        }
    }

    info!("🔌 Observador desconectado");
}
