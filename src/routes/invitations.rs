use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::invitation::{CreateInvitationRequest, Invitation, InvitationView},
    services::authz::building_permissions,
    services::invitations::InvitationService,
    services::memberships::MembershipService,
    AppState,
};

pub async fn create_invitation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(building_id): Path<String>,
    Json(body): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<Invitation>), ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !building_permissions(&roles, &building_id).can_manage_children {
        return Err(ApiError::PermissionDenied(
            "Only parents can invite users".into(),
        ));
    }
    let invitation = InvitationService::create(
        &state.db,
        state.email.as_deref(),
        &state.notifications,
        &building_id,
        &user.email,
        &body.email,
        &state.config.app_base_url,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn list_building_invitations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(building_id): Path<String>,
) -> Result<Json<Vec<Invitation>>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !building_permissions(&roles, &building_id).can_manage_children {
        return Err(ApiError::PermissionDenied(
            "Only parents can view pending invitations".into(),
        ));
    }
    let invitations = InvitationService::list_for_building(&state.db, &building_id).await?;
    Ok(Json(invitations))
}

pub async fn list_my_invitations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<InvitationView>>, ApiError> {
    let invitations = InvitationService::list_for_user(&state.db, &user.email).await?;
    Ok(Json(invitations))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Invitation>, ApiError> {
    let invitation = InvitationService::respond(&state.db, id, &user.email, true).await?;
    Ok(Json(invitation))
}

pub async fn decline_invitation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Invitation>, ApiError> {
    let invitation = InvitationService::respond(&state.db, id, &user.email, false).await?;
    Ok(Json(invitation))
}
