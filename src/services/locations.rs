use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::location::{location_id, Location};

pub struct LocationService;

impl LocationService {
    pub async fn list(pool: &PgPool, building_id: &str) -> Result<Vec<Location>, ApiError> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations WHERE building_id = $1 ORDER BY name",
        )
        .bind(building_id)
        .fetch_all(pool)
        .await?;
        Ok(locations)
    }

    pub async fn create(pool: &PgPool, building_id: &str, name: &str) -> Result<Location, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Location name is required".into()));
        }

        let id = location_id(building_id, name);
        let location = sqlx::query_as::<_, Location>(
            "INSERT INTO locations (id, building_id, name) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&id)
        .bind(building_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                ApiError::Conflict("A location with this name already exists".into())
            }
            other => other.into(),
        })?;
        Ok(location)
    }

    /// Remove a location. Refused while any device sits in it or any
    /// children grant of the building still references it; the caller must
    /// detach/reassign first. State is unchanged on rejection.
    pub async fn remove(pool: &PgPool, building_id: &str, location_id: &str) -> Result<(), ApiError> {
        let devices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices WHERE location_id = $1")
            .bind(location_id)
            .fetch_one(pool)
            .await?;
        if devices > 0 {
            return Err(ApiError::Conflict(format!(
                "Location still has {devices} device(s) assigned"
            )));
        }

        let references: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_buildings
             WHERE building_id = $1 AND $2 = ANY(assigned_locations)",
        )
        .bind(building_id)
        .bind(location_id)
        .fetch_one(pool)
        .await?;
        if references > 0 {
            return Err(ApiError::Conflict(format!(
                "Location is still assigned to {references} member(s)"
            )));
        }

        let deleted = sqlx::query("DELETE FROM locations WHERE id = $1 AND building_id = $2")
            .bind(location_id)
            .bind(building_id)
            .execute(pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ApiError::NotFound("Location not found".into()));
        }
        Ok(())
    }
}
