use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::energy::{EnergyQuery, EnergySeries},
    services::authz::{location_visibility, visible_device_ids, Visibility},
    services::devices::DeviceService,
    services::energy::EnergyService,
    services::memberships::MembershipService,
    AppState,
};

/// Read-only usage series for the building, restricted to the devices the
/// acting user may see. A children member with no assignment gets an empty
/// series, never other members' consumption.
pub async fn building_energy(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(building_id): Path<String>,
    Query(query): Query<EnergyQuery>,
) -> Result<Json<EnergySeries>, ApiError> {
    let roles = MembershipService::role_set(&state.db, &user.email).await?;
    let vis = location_visibility(&roles, &building_id);
    if vis == Visibility::Hidden {
        return Err(ApiError::PermissionDenied(
            "Energy usage of this building is not visible to you".into(),
        ));
    }

    let all = DeviceService::list_in_building(&state.db, &building_id).await?;
    let mut device_ids = visible_device_ids(
        &vis,
        all.iter().map(|d| (d.id.as_str(), d.location_id.as_deref())),
    );

    if let Some(device) = &query.device {
        if !device_ids.contains(device) {
            return Err(ApiError::NotFound("Device not found in this building".into()));
        }
        device_ids = vec![device.clone()];
    }

    let series = EnergyService::series_for_devices(&state.db, &device_ids, &query).await?;
    Ok(Json(series))
}
