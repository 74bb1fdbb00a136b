use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A metering device. The id is the pre-provisioned hardware token printed
/// on the unit; `location_id` is null while unassigned.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Device {
    pub id: String,
    pub location_id: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignDeviceRequest {
    /// None detaches the device from its current location.
    pub location_id: Option<String>,
}
