use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::membership::{MemberRow, SetAssignedLocationsRequest},
    services::authz::building_permissions,
    services::memberships::MembershipService,
    AppState,
};

/// Parents manage the member list; admins and the system admin may look at
/// it (view-only).
pub async fn list_members(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(building_id): Path<String>,
) -> Result<Json<Vec<MemberRow>>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    let perms = building_permissions(&roles, &building_id);
    if !perms.can_manage_children && !perms.can_edit_building {
        return Err(ApiError::PermissionDenied(
            "You cannot view this building's members".into(),
        ));
    }
    let members = MembershipService::list_members(&state.db, &building_id).await?;
    Ok(Json(members))
}

pub async fn set_assigned_locations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((building_id, member_email)): Path<(String, String)>,
    Json(body): Json<SetAssignedLocationsRequest>,
) -> Result<Json<MemberRow>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !building_permissions(&roles, &building_id).can_manage_children {
        return Err(ApiError::PermissionDenied(
            "Only parents can assign locations to members".into(),
        ));
    }
    let member = MembershipService::set_assigned_locations(
        &state.db,
        &building_id,
        &member_email,
        &body.assigned_locations,
    )
    .await?;
    Ok(Json(member))
}

/// Parents remove members; anyone may leave a building themselves.
pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((building_id, member_email)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    let leaving_self = member_email == user.email;
    if !leaving_self && !building_permissions(&roles, &building_id).can_manage_children {
        return Err(ApiError::PermissionDenied(
            "Only parents can remove members".into(),
        ));
    }
    MembershipService::remove(&state.db, &building_id, &member_email).await?;
    Ok(StatusCode::NO_CONTENT)
}
