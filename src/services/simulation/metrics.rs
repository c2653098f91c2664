//! Métricas Prometheus del motor de simulación

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref TICKS_TOTAL: IntCounter =
        IntCounter::new("livebus_ticks_total", "Ticks ejecutados").expect("metric definition");

    pub static ref POSITIONS_RECORDED_TOTAL: IntCounter =
        IntCounter::new("livebus_positions_recorded_total", "Posiciones guardadas").expect("metric definition");

    pub static ref VEHICLE_FAILURES_TOTAL: IntCounter =
        IntCounter::new("livebus_vehicle_failures_total", "Avances de vehículo perdidos por error de persistencia")
            .expect("metric definition");

    pub static ref TICK_PANICS_TOTAL: IntCounter =
        IntCounter::new("livebus_tick_panics_total", "Ticks abortados").expect("metric definition");

    pub static ref FLEET_SIZE: IntGauge =
        IntGauge::new("livebus_fleet_size", "Vehículos en el registro de la flota").expect("metric definition");

    pub static ref TICK_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("livebus_tick_duration_seconds", "Duración de cada tick")
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])
    )
    .expect("metric definition");
}

/// Registrar todas las métricas en el registro global. Se puede llamar más de una vez.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TICKS_TOTAL.clone()),
        Box::new(POSITIONS_RECORDED_TOTAL.clone()),
        Box::new(VEHICLE_FAILURES_TOTAL.clone()),
        Box::new(TICK_PANICS_TOTAL.clone()),
        Box::new(FLEET_SIZE.clone()),
        Box::new(TICK_DURATION_SECONDS.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => tracing::warn!("⚠️ No se pudo registrar una métrica: {}", e),
        }
    }
}

/// Exportar en formato texto de Prometheus
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!("⚠️ Error codificando métricas: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
