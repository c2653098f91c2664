use crate::models::{NewPosition, Position};
use crate::utils::errors::StoreError;
use sqlx::{PgConnection, PgPool};

pub struct PositionRepository {
    pool: PgPool,
}

impl PositionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(conn: &mut PgConnection, position: &NewPosition) -> Result<Position, StoreError> {
        let created = sqlx::query_as::<_, Position>(
            r#"
            INSERT INTO positions (vehicle_id, latitude, longitude, recorded_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, vehicle_id, latitude, longitude, recorded_at
            "#
        )
        .bind(position.vehicle_id)
        .bind(position.latitude)
        .bind(position.longitude)
        .bind(position.recorded_at)
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    pub async fn latest_for_vehicle(&self, vehicle_id: i32) -> Result<Option<Position>, StoreError> {
        let position = sqlx::query_as::<_, Position>(
            r#"
            SELECT id, vehicle_id, latitude, longitude, recorded_at
            FROM positions
            WHERE vehicle_id = $1
            ORDER BY id DESC
            LIMIT 1
            "#
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(position)
    }
}
