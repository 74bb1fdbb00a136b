use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::user::{UpdateProfileRequest, User, UserBuildingView, UserProfile},
    services::authz::{cross_user_access, visible_buildings_of_target, UserAccess},
    services::memberships::MembershipService,
    AppState,
};

pub async fn get_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(target_email): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let acting = MembershipService::role_set(&state.db, &user.email).await?;
    let target = MembershipService::role_set(&state.db, &target_email).await?;
    if cross_user_access(&user.email, &acting, &target_email, &target) == UserAccess::None {
        // Fail closed without confirming whether the account exists.
        return Err(ApiError::PermissionDenied(
            "You cannot view this user".into(),
        ));
    }

    let profile: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&target_email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(profile.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if let Some(name) = &body.display_name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Display name cannot be empty".into()));
        }
    }
    let updated: User = sqlx::query_as(
        "UPDATE users SET
           display_name   = COALESCE($2, display_name),
           contact_number = COALESCE($3, contact_number),
           updated_at     = NOW()
         WHERE email = $1
         RETURNING *",
    )
    .bind(&user.email)
    .bind(body.display_name.as_deref().map(str::trim))
    .bind(&body.contact_number)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(updated.into()))
}

/// The target's building list, scoped by who is asking: self sees all,
/// the system admin sees only buildings where the target is parent, a
/// parent sees the shared buildings they manage the target in.
pub async fn get_user_buildings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(target_email): Path<String>,
) -> Result<Json<Vec<UserBuildingView>>, ApiError> {
    let acting = MembershipService::role_set(&state.db, &user.email).await?;
    let target = MembershipService::role_set(&state.db, &target_email).await?;
    if cross_user_access(&user.email, &acting, &target_email, &target) == UserAccess::None {
        return Err(ApiError::PermissionDenied(
            "You cannot view this user".into(),
        ));
    }

    let visible = visible_buildings_of_target(&user.email, &acting, &target_email, &target);
    let views = sqlx::query_as::<_, UserBuildingView>(
        "SELECT b.id AS building_id, b.name AS building_name, ub.role
         FROM user_buildings ub
         JOIN buildings b ON b.id = ub.building_id
         WHERE ub.user_email = $1 AND ub.building_id = ANY($2)
         ORDER BY b.name",
    )
    .bind(&target_email)
    .bind(&visible)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(views))
}
