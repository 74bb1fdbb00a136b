use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::membership::{MemberRow, Role, UserBuilding, SYSTEM_ADMIN_BUILDING};
use crate::services::authz::RoleSet;

pub struct MembershipService;

impl MembershipService {
    /// Resolve a user's grants across all buildings. Callers must not
    /// swallow the error into an elevated default; a failed lookup means
    /// no access.
    pub async fn role_set(pool: &PgPool, email: &str) -> Result<RoleSet, ApiError> {
        let rows: Vec<UserBuilding> = sqlx::query_as(
            "SELECT user_email, building_id, role, assigned_locations, granted_at
             FROM user_buildings WHERE user_email = $1",
        )
        .bind(email)
        .fetch_all(pool)
        .await?;
        Ok(RoleSet::from_rows(&rows))
    }

    pub async fn is_member(pool: &PgPool, building_id: &str, email: &str) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_buildings WHERE building_id = $1 AND user_email = $2)",
        )
        .bind(building_id)
        .bind(email)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn list_members(pool: &PgPool, building_id: &str) -> Result<Vec<MemberRow>, ApiError> {
        let members = sqlx::query_as::<_, MemberRow>(
            "SELECT ub.user_email, u.display_name, ub.role, ub.assigned_locations, ub.granted_at
             FROM user_buildings ub
             JOIN users u ON u.email = ub.user_email
             WHERE ub.building_id = $1
             ORDER BY ub.role, u.display_name",
        )
        .bind(building_id)
        .fetch_all(pool)
        .await?;
        Ok(members)
    }

    /// Replace a children member's location allowlist. Every id must be a
    /// location of this building; parents/admins carry no allowlist.
    pub async fn set_assigned_locations(
        pool: &PgPool,
        building_id: &str,
        member_email: &str,
        location_ids: &[String],
    ) -> Result<MemberRow, ApiError> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM user_buildings WHERE building_id = $1 AND user_email = $2",
        )
        .bind(building_id)
        .bind(member_email)
        .fetch_optional(pool)
        .await?;

        match role.as_deref() {
            None => return Err(ApiError::NotFound("Membership not found".into())),
            Some(r) if r != Role::Children.to_string() => {
                return Err(ApiError::Validation(
                    "Assigned locations only apply to children members".into(),
                ))
            }
            Some(_) => {}
        }

        let known: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM locations WHERE building_id = $1 AND id = ANY($2)",
        )
        .bind(building_id)
        .bind(location_ids)
        .fetch_one(pool)
        .await?;
        if known as usize != location_ids.len() {
            return Err(ApiError::Validation(
                "Assigned locations must all belong to this building".into(),
            ));
        }

        sqlx::query(
            "UPDATE user_buildings SET assigned_locations = $3
             WHERE building_id = $1 AND user_email = $2",
        )
        .bind(building_id)
        .bind(member_email)
        .bind(location_ids)
        .execute(pool)
        .await?;

        let member = sqlx::query_as::<_, MemberRow>(
            "SELECT ub.user_email, u.display_name, ub.role, ub.assigned_locations, ub.granted_at
             FROM user_buildings ub
             JOIN users u ON u.email = ub.user_email
             WHERE ub.building_id = $1 AND ub.user_email = $2",
        )
        .bind(building_id)
        .bind(member_email)
        .fetch_one(pool)
        .await?;
        Ok(member)
    }

    pub async fn remove(pool: &PgPool, building_id: &str, email: &str) -> Result<(), ApiError> {
        // The sentinel is not a membership anyone removes through this API.
        if building_id == SYSTEM_ADMIN_BUILDING {
            return Err(ApiError::NotFound("Membership not found".into()));
        }
        let deleted = sqlx::query(
            "DELETE FROM user_buildings WHERE building_id = $1 AND user_email = $2",
        )
        .bind(building_id)
        .bind(email)
        .execute(pool)
        .await?;
        if deleted.rows_affected() == 0 {
            return Err(ApiError::NotFound("Membership not found".into()));
        }
        Ok(())
    }
}
