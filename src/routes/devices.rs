use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::device::{AssignDeviceRequest, Device, RegisterDeviceRequest},
    services::authz::{building_permissions, location_visibility, visible_device_ids, Visibility},
    services::devices::DeviceService,
    services::memberships::MembershipService,
    AppState,
};

use super::locations::UNASSIGNED_MESSAGE;

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub devices: Vec<Device>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn list_building_devices(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(building_id): Path<String>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    match location_visibility(&roles, &building_id) {
        vis @ (Visibility::Full | Visibility::Assigned(_)) => {
            let all = DeviceService::list_in_building(&state.db, &building_id).await?;
            let allowed = visible_device_ids(
                &vis,
                all.iter().map(|d| (d.id.as_str(), d.location_id.as_deref())),
            );
            let devices = all.into_iter().filter(|d| allowed.contains(&d.id)).collect();
            Ok(Json(DeviceListResponse {
                devices,
                message: None,
            }))
        }
        Visibility::Unassigned => Ok(Json(DeviceListResponse {
            devices: Vec::new(),
            message: Some(UNASSIGNED_MESSAGE.into()),
        })),
        Visibility::Hidden => Err(ApiError::PermissionDenied(
            "Devices of this building are not visible to you".into(),
        )),
    }
}

/// Device provisioning is a platform operation, not a per-building one.
pub async fn register_device(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !roles.is_system_admin() {
        return Err(ApiError::PermissionDenied(
            "Only system administrators can register devices".into(),
        ));
    }
    let device = DeviceService::register(&state.db, &body.id).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn list_unassigned_devices(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Device>>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !roles.is_system_admin() {
        return Err(ApiError::PermissionDenied(
            "Only system administrators can list unassigned devices".into(),
        ));
    }
    let devices = DeviceService::list_unassigned(&state.db).await?;
    Ok(Json(devices))
}

pub async fn assign_device(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((building_id, device_id)): Path<(String, String)>,
    Json(body): Json<AssignDeviceRequest>,
) -> Result<Json<Device>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    if !building_permissions(&roles, &building_id).can_manage_locations {
        return Err(ApiError::PermissionDenied(
            "Only parents can assign devices".into(),
        ));
    }
    let device = DeviceService::assign(
        &state.db,
        &building_id,
        &device_id,
        body.location_id.as_deref(),
    )
    .await?;
    Ok(Json(device))
}
