use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use dotenvy::dotenv;

use livebus::config::{DatabaseConfig, EnvironmentConfig, SimulationConfig};
use livebus::database::DatabaseConnection;
use livebus::routes::create_app_router;
use livebus::services::simulation::{
    metrics, BroadcastPublisher, PgSimulationStore, SimulationEngine, SimulationScope, SimulationStore,
};
use livebus::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("livebus=debug,tower_http=info,info")),
        )
        .init();

    info!("🚌 LiveBus - Simulación de posiciones en vivo");
    info!("============================================");

    let env_config = EnvironmentConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let sim_config = SimulationConfig::from_env()?;

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::new(&db_config).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    metrics::register_metrics();

    let store: Arc<dyn SimulationStore> = Arc::new(PgSimulationStore::new(db_connection.pool().clone()));
    let events = BroadcastPublisher::new(sim_config.event_capacity);
    let autostart = sim_config.autostart;
    let engine = Arc::new(SimulationEngine::new(
        store.clone(),
        Arc::new(events.clone()),
        sim_config,
    ));

    // Sin datos iniciales el servicio arranca con la flota vacía
    if let Err(e) = engine.load_initial_data().await {
        error!("❌ Error al cargar datos iniciales: {}", e);
    }
    engine.spawn();

    if autostart {
        if let Err(e) = engine.start(SimulationScope::All).await {
            warn!("⚠️ No se pudo arrancar la simulación: {}", e);
        }
    }

    let app = create_app_router(AppState::new(env_config.clone(), store, engine.clone(), events));

    let addr: SocketAddr = env_config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("   GET  /metrics - Métricas Prometheus");
    info!("⏱️ Endpoints - Simulación:");
    info!("   POST /api/simulation/start[?route_id=N] - Iniciar");
    info!("   POST /api/simulation/pause[?route_id=N] - Pausar");
    info!("   POST /api/simulation/restart[?route_id=N] - Reiniciar");
    info!("   POST /api/simulation/assign - Asignar ruta a un autobús");
    info!("   GET  /api/simulation/active-vehicles - Flota en memoria");
    info!("   GET  /api/simulation/status - Estado del temporizador");
    info!("🗺️ Endpoints - Rutas:");
    info!("   GET  /api/routes[?all=true] - Listar rutas");
    info!("   POST /api/routes/:id/visibility - Habilitar/deshabilitar");
    info!("   POST /api/routes/:id/reload - Recargar puntos");
    info!("   DELETE /api/routes/:id - Eliminar ruta");
    info!("🚍 Endpoints - Vehículos:");
    info!("   GET  /api/vehicles/:id/position - Posición actual");
    info!("📡 WebSocket:");
    info!("   GET  /ws/simulation - Eventos en vivo");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    // El temporizador se detiene antes de soltar el pool
    engine.shutdown().await;
    db_connection.close().await;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
