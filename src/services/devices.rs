use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::device::Device;

pub struct DeviceService;

impl DeviceService {
    /// Register a pre-provisioned hardware token. The device starts
    /// unassigned.
    pub async fn register(pool: &PgPool, id: &str) -> Result<Device, ApiError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::Validation("Device id is required".into()));
        }
        let device = sqlx::query_as::<_, Device>(
            "INSERT INTO devices (id) VALUES ($1) RETURNING *",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                ApiError::Conflict("Device is already registered".into())
            }
            other => other.into(),
        })?;
        Ok(device)
    }

    /// All devices sitting in the building's locations, any role filtering
    /// happens in the handler via the visibility rules.
    pub async fn list_in_building(pool: &PgPool, building_id: &str) -> Result<Vec<Device>, ApiError> {
        let devices = sqlx::query_as::<_, Device>(
            "SELECT d.* FROM devices d
             JOIN locations l ON l.id = d.location_id
             WHERE l.building_id = $1
             ORDER BY d.id",
        )
        .bind(building_id)
        .fetch_all(pool)
        .await?;
        Ok(devices)
    }

    pub async fn list_unassigned(pool: &PgPool) -> Result<Vec<Device>, ApiError> {
        let devices = sqlx::query_as::<_, Device>(
            "SELECT * FROM devices WHERE location_id IS NULL ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(devices)
    }

    /// Move a device into a location of the given building, or detach it
    /// (`location_id = None`). Attaching requires the target location to
    /// belong to the building; detaching requires the device to currently
    /// sit in one of the building's locations.
    pub async fn assign(
        pool: &PgPool,
        building_id: &str,
        device_id: &str,
        location_id: Option<&str>,
    ) -> Result<Device, ApiError> {
        match location_id {
            Some(loc) => {
                let belongs: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1 AND building_id = $2)",
                )
                .bind(loc)
                .bind(building_id)
                .fetch_one(pool)
                .await?;
                if !belongs {
                    return Err(ApiError::NotFound(
                        "Location not found in this building".into(),
                    ));
                }
                sqlx::query_as::<_, Device>(
                    "UPDATE devices SET location_id = $1 WHERE id = $2 RETURNING *",
                )
                .bind(loc)
                .bind(device_id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| ApiError::NotFound("Device not found".into()))
            }
            None => sqlx::query_as::<_, Device>(
                "UPDATE devices SET location_id = NULL
                 WHERE id = $1 AND location_id IN
                       (SELECT id FROM locations WHERE building_id = $2)
                 RETURNING *",
            )
            .bind(device_id)
            .bind(building_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Device not found in this building".into())),
        }
    }
}
