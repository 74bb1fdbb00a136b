use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::location::{CreateLocationRequest, Location},
    services::authz::{building_permissions, location_visibility, visible_location_ids, Visibility},
    services::locations::LocationService,
    services::memberships::MembershipService,
    AppState,
};

/// Shown to children members with an empty allowlist instead of a generic
/// "not found".
pub const UNASSIGNED_MESSAGE: &str =
    "No locations have been assigned to you yet. Ask a parent of this building to assign you locations.";

#[derive(Debug, Serialize)]
pub struct LocationListResponse {
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn list_locations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(building_id): Path<String>,
) -> Result<Json<LocationListResponse>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    match location_visibility(&roles, &building_id) {
        Visibility::Full => {
            let locations = LocationService::list(&state.db, &building_id).await?;
            Ok(Json(LocationListResponse {
                locations,
                message: None,
            }))
        }
        vis @ Visibility::Assigned(_) => {
            let all = LocationService::list(&state.db, &building_id).await?;
            let allowed =
                visible_location_ids(&vis, all.iter().map(|l| l.id.as_str()));
            let locations = all
                .into_iter()
                .filter(|l| allowed.contains(&l.id))
                .collect();
            Ok(Json(LocationListResponse {
                locations,
                message: None,
            }))
        }
        Visibility::Unassigned => Ok(Json(LocationListResponse {
            locations: Vec::new(),
            message: Some(UNASSIGNED_MESSAGE.into()),
        })),
        Visibility::Hidden => Err(ApiError::PermissionDenied(
            "Locations of this building are not visible to you".into(),
        )),
    }
}

pub async fn create_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(building_id): Path<String>,
    Json(body): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !building_permissions(&roles, &building_id).can_manage_locations {
        return Err(ApiError::PermissionDenied(
            "Only parents can manage locations".into(),
        ));
    }
    let location = LocationService::create(&state.db, &building_id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn delete_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((building_id, location_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !building_permissions(&roles, &building_id).can_manage_locations {
        return Err(ApiError::PermissionDenied(
            "Only parents can manage locations".into(),
        ));
    }
    LocationService::remove(&state.db, &building_id, &location_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
