use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::building::{Building, BuildingSummary, CreateBuildingRequest, UpdateBuildingRequest},
    services::authz::building_permissions,
    services::buildings::BuildingService,
    services::memberships::MembershipService,
    AppState,
};

pub async fn list_buildings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<BuildingSummary>>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    let buildings =
        BuildingService::list_for_user(&state.db, &user.email, roles.is_system_admin()).await?;
    Ok(Json(buildings))
}

pub async fn get_building(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Building>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !building_permissions(&roles, &id).can_view_building {
        return Err(ApiError::PermissionDenied(
            "You do not have access to this building".into(),
        ));
    }
    let building = BuildingService::get(&state.db, &id).await?;
    Ok(Json(building))
}

pub async fn create_building(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateBuildingRequest>,
) -> Result<(StatusCode, Json<Building>), ApiError> {
    let building = BuildingService::create(&state.db, &user.email, &body).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

pub async fn update_building(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateBuildingRequest>,
) -> Result<Json<Building>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !building_permissions(&roles, &id).can_edit_building {
        return Err(ApiError::PermissionDenied(
            "Only parents or admins can edit this building".into(),
        ));
    }
    let building = BuildingService::update(&state.db, &id, &body).await?;
    Ok(Json(building))
}

pub async fn delete_building(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !building_permissions(&roles, &id).can_delete_building {
        return Err(ApiError::PermissionDenied(
            "Only parents or admins can delete this building".into(),
        ));
    }
    BuildingService::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
