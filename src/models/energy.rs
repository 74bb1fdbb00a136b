use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One metering sample. The upstream documents spelled the value field
/// both `usage` and `Usage`; here it is one explicit column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EnergySample {
    pub id: Uuid,
    pub device_id: String,
    pub usage_wh: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct EnergyQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Restrict to a single device of the building.
    pub device: Option<String>,
    /// When true, bucket samples into per-day totals.
    #[serde(default)]
    pub daily: bool,
}

#[derive(Debug, Serialize, FromRow)]
pub struct DailyUsage {
    pub day: NaiveDate,
    pub device_id: String,
    pub usage_wh: f64,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EnergySeries {
    Samples(Vec<EnergySample>),
    Daily(Vec<DailyUsage>),
}
