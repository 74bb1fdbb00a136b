use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::building::{
    is_valid_building_id, Building, BuildingSummary, CreateBuildingRequest, UpdateBuildingRequest,
};
use crate::models::location::location_id;
use crate::models::membership::{Role, SYSTEM_ADMIN_BUILDING};

pub struct BuildingService;

impl BuildingService {
    /// Buildings the user belongs to, labelled with their role there. The
    /// system admin sees every building (admin-equivalent), everyone else
    /// sees exactly their grants. The sentinel row never joins a real
    /// building, and is filtered explicitly besides.
    pub async fn list_for_user(
        pool: &PgPool,
        email: &str,
        system_admin: bool,
    ) -> Result<Vec<BuildingSummary>, ApiError> {
        let buildings = if system_admin {
            sqlx::query_as::<_, BuildingSummary>(
                "SELECT b.id, b.name, b.address,
                        COALESCE(ub.role, 'admin') AS role
                 FROM buildings b
                 LEFT JOIN user_buildings ub
                        ON ub.building_id = b.id AND ub.user_email = $1
                 ORDER BY b.name",
            )
            .bind(email)
            .fetch_all(pool)
            .await?
        } else {
            sqlx::query_as::<_, BuildingSummary>(
                "SELECT b.id, b.name, b.address, ub.role
                 FROM user_buildings ub
                 JOIN buildings b ON b.id = ub.building_id
                 WHERE ub.user_email = $1 AND ub.building_id <> $2
                 ORDER BY b.name",
            )
            .bind(email)
            .bind(SYSTEM_ADMIN_BUILDING)
            .fetch_all(pool)
            .await?
        };
        Ok(buildings)
    }

    pub async fn get(pool: &PgPool, id: &str) -> Result<Building, ApiError> {
        sqlx::query_as::<_, Building>("SELECT * FROM buildings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Building not found".into()))
    }

    /// Create a building together with its first location and any devices
    /// going into it, and grant the creator the parent role. One
    /// transaction: a building never exists half-provisioned.
    pub async fn create(
        pool: &PgPool,
        creator_email: &str,
        req: &CreateBuildingRequest,
    ) -> Result<Building, ApiError> {
        if !is_valid_building_id(&req.id) {
            return Err(ApiError::Validation(
                "Building id must be 2-63 ASCII letters, digits or hyphens".into(),
            ));
        }
        if req.id == SYSTEM_ADMIN_BUILDING {
            return Err(ApiError::Validation("Building id is reserved".into()));
        }
        if req.name.trim().is_empty() {
            return Err(ApiError::Validation("Building name is required".into()));
        }
        if req.first_location_name.trim().is_empty() {
            return Err(ApiError::Validation("First location name is required".into()));
        }

        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM buildings WHERE id = $1)")
            .bind(&req.id)
            .fetch_one(pool)
            .await?;
        if taken {
            return Err(ApiError::Validation("Building id is already taken".into()));
        }

        let mut tx = pool.begin().await?;

        let building = sqlx::query_as::<_, Building>(
            "INSERT INTO buildings (id, name, address, description, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&req.id)
        .bind(req.name.trim())
        .bind(&req.address)
        .bind(&req.description)
        .bind(creator_email)
        .fetch_one(&mut *tx)
        .await?;

        let loc_id = location_id(&req.id, req.first_location_name.trim());
        sqlx::query("INSERT INTO locations (id, building_id, name) VALUES ($1, $2, $3)")
            .bind(&loc_id)
            .bind(&req.id)
            .bind(req.first_location_name.trim())
            .execute(&mut *tx)
            .await?;

        for device_id in &req.device_ids {
            let updated = sqlx::query(
                "UPDATE devices SET location_id = $1 WHERE id = $2 AND location_id IS NULL",
            )
            .bind(&loc_id)
            .bind(device_id)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                // Dropping the tx rolls the whole creation back.
                return Err(ApiError::Validation(format!(
                    "Device '{device_id}' is unknown or already assigned"
                )));
            }
        }

        sqlx::query(
            "INSERT INTO user_buildings (user_email, building_id, role) VALUES ($1, $2, $3)",
        )
        .bind(creator_email)
        .bind(&req.id)
        .bind(Role::Parent.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(building)
    }

    pub async fn update(
        pool: &PgPool,
        id: &str,
        req: &UpdateBuildingRequest,
    ) -> Result<Building, ApiError> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(ApiError::Validation("Building name cannot be empty".into()));
            }
        }
        sqlx::query_as::<_, Building>(
            "UPDATE buildings SET
               name        = COALESCE($2, name),
               address     = COALESCE($3, address),
               description = COALESCE($4, description),
               updated_at  = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.address)
        .bind(&req.description)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Building not found".into()))
    }

    /// Cascade delete: locations and relationship rows go, devices are
    /// detached but never deleted (the hardware still exists). Runs in one
    /// transaction so a failure mid-cascade leaves nothing orphaned.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<(), ApiError> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE devices SET location_id = NULL
             WHERE location_id IN (SELECT id FROM locations WHERE building_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM locations WHERE building_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM user_buildings WHERE building_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM invitations WHERE building_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM buildings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ApiError::NotFound("Building not found".into()));
        }

        tx.commit().await?;
        Ok(())
    }
}
