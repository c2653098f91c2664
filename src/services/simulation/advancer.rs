//! Cálculo del siguiente punto de un vehículo sobre su ruta.
//!
//! Función pura: no toca el registro, ni la base de datos, ni el reloj.

use crate::models::Waypoint;

/// Resultado de avanzar un vehículo un paso
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    /// Índice efectivo antes de avanzar (ya normalizado)
    pub from_index: usize,
    pub new_index: usize,
    /// Coordenadas del punto alcanzado, a emitir como posición actual
    pub latitude: f64,
    pub longitude: f64,
}

/// Avanzar desde `current_index` sobre `waypoints` (ya ordenados).
///
/// Si la ruta tiene un solo punto o el índice está fuera de rango se normaliza a 0.
/// La posición emitida es la del índice antes de avanzar. Devuelve `None` si la
/// ruta no tiene puntos.
pub fn advance(current_index: usize, waypoints: &[Waypoint]) -> Option<Advance> {
    let len = waypoints.len();
    if len == 0 {
        return None;
    }

    let from_index = if len <= 1 || current_index >= len { 0 } else { current_index };
    let reached = &waypoints[from_index];

    Some(Advance {
        from_index,
        new_index: (from_index + 1) % len,
        latitude: reached.latitude,
        longitude: reached.longitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(points: &[(f64, f64)]) -> Vec<Waypoint> {
        points
            .iter()
            .enumerate()
            .map(|(i, (lat, lon))| Waypoint {
                id: i as i32 + 1,
                route_id: 1,
                order_index: i as i32,
                latitude: *lat,
                longitude: *lon,
            })
            .collect()
    }

    #[test]
    fn test_three_point_route_wraps() {
        let waypoints = route(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);

        let first = advance(0, &waypoints).unwrap();
        assert_eq!((first.latitude, first.longitude, first.new_index), (0.0, 0.0, 1));

        let second = advance(first.new_index, &waypoints).unwrap();
        assert_eq!((second.latitude, second.longitude, second.new_index), (1.0, 1.0, 2));

        let third = advance(second.new_index, &waypoints).unwrap();
        assert_eq!((third.latitude, third.longitude, third.new_index), (2.0, 2.0, 0));
    }

    #[test]
    fn test_cyclic_closure_for_every_start() {
        for n in 2..7 {
            let points: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, -(i as f64))).collect();
            let waypoints = route(&points);
            for start in 0..n {
                let mut index = start;
                for _ in 0..n {
                    index = advance(index, &waypoints).unwrap().new_index;
                }
                assert_eq!(index, start, "n={} start={}", n, start);
            }
        }
    }

    #[test]
    fn test_single_waypoint_never_moves() {
        let waypoints = route(&[(42.23, -8.71)]);
        let mut index = 0;
        for _ in 0..5 {
            let step = advance(index, &waypoints).unwrap();
            assert_eq!((step.latitude, step.longitude), (42.23, -8.71));
            assert_eq!(step.new_index, 0);
            index = step.new_index;
        }
    }

    #[test]
    fn test_out_of_range_index_normalized() {
        let waypoints = route(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let step = advance(7, &waypoints).unwrap();
        assert_eq!(step.from_index, 0);
        assert_eq!(step.new_index, 1);
        assert_eq!((step.latitude, step.longitude), (0.0, 0.0));
    }

    #[test]
    fn test_empty_route_has_no_advance() {
        assert!(advance(0, &[]).is_none());
    }
}
