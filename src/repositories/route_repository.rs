use crate::models::{Route, Waypoint};
use crate::utils::errors::StoreError;
use sqlx::PgPool;

pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Route>, StoreError> {
        let route = sqlx::query_as::<_, Route>("SELECT id, description, enabled FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(route)
    }

    pub async fn list(&self, enabled_only: bool) -> Result<Vec<Route>, StoreError> {
        let routes = sqlx::query_as::<_, Route>(
            "SELECT id, description, enabled FROM routes WHERE ($1 = FALSE OR enabled) ORDER BY id"
        )
        .bind(enabled_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(routes)
    }

    pub async fn waypoints_for_route(&self, route_id: i32) -> Result<Vec<Waypoint>, StoreError> {
        let waypoints = sqlx::query_as::<_, Waypoint>(
            r#"
            SELECT id, route_id, order_index, latitude, longitude
            FROM waypoints
            WHERE route_id = $1
            ORDER BY order_index
            "#
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(waypoints)
    }

    pub async fn waypoints_for_routes(&self, route_ids: &[i32]) -> Result<Vec<Waypoint>, StoreError> {
        let waypoints = sqlx::query_as::<_, Waypoint>(
            r#"
            SELECT id, route_id, order_index, latitude, longitude
            FROM waypoints
            WHERE route_id = ANY($1)
            ORDER BY route_id, order_index
            "#
        )
        .bind(route_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(waypoints)
    }

    pub async fn set_enabled(&self, id: i32, enabled: bool) -> Result<Route, StoreError> {
        let route = sqlx::query_as::<_, Route>(
            "UPDATE routes SET enabled = $2 WHERE id = $1 RETURNING id, description, enabled"
        )
        .bind(id)
        .bind(enabled)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Route", id))?;

        Ok(route)
    }

    /// Eliminar una ruta con sus puntos y desasignar sus vehículos en una sola transacción.
    /// Devuelve los ids de los vehículos desasignados.
    pub async fn delete_cascade(&self, id: i32) -> Result<Vec<i32>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM routes WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists.0 {
            return Err(StoreError::not_found("Route", id));
        }

        let detached: Vec<(i32,)> = sqlx::query_as(
            "UPDATE vehicles SET route_id = NULL, waypoint_index = 0 WHERE route_id = $1 RETURNING id"
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM waypoints WHERE route_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(detached.into_iter().map(|(vehicle_id,)| vehicle_id).collect())
    }
}
