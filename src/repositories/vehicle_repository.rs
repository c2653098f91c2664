use crate::models::Vehicle;
use crate::utils::errors::StoreError;
use sqlx::{PgConnection, PgPool};

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Vehicle>, StoreError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT id, name, status, route_id, waypoint_index FROM vehicles WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn list_all(&self) -> Result<Vec<Vehicle>, StoreError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT id, name, status, route_id, waypoint_index FROM vehicles ORDER BY id"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    pub async fn update(&self, vehicle: &Vehicle) -> Result<Vehicle, StoreError> {
        let updated = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET name = $2, status = $3, route_id = $4, waypoint_index = $5
            WHERE id = $1
            RETURNING id, name, status, route_id, waypoint_index
            "#
        )
        .bind(vehicle.id)
        .bind(&vehicle.name)
        .bind(&vehicle.status)
        .bind(vehicle.route_id)
        .bind(vehicle.waypoint_index)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Vehicle", vehicle.id))?;

        Ok(updated)
    }

    /// Actualizar solo el puntero de punto actual dentro de una transacción abierta.
    /// Devuelve `false` si el vehículo ya no está asignado a `route_id`.
    pub async fn update_waypoint_index(
        conn: &mut PgConnection,
        id: i32,
        route_id: i32,
        waypoint_index: i32,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE vehicles SET waypoint_index = $2 WHERE id = $1 AND route_id = $3")
            .bind(id)
            .bind(waypoint_index)
            .bind(route_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
