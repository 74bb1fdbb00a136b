use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::energy::{DailyUsage, EnergyQuery, EnergySample, EnergySeries};

pub struct EnergyService;

impl EnergyService {
    /// Usage series for an already visibility-filtered set of devices.
    /// The handler decides which devices the acting user may see; this
    /// function only windows and (optionally) buckets.
    pub async fn series_for_devices(
        pool: &PgPool,
        device_ids: &[String],
        query: &EnergyQuery,
    ) -> Result<EnergySeries, ApiError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(ApiError::Validation(
                    "'from' must not be later than 'to'".into(),
                ));
            }
        }
        if device_ids.is_empty() {
            return Ok(if query.daily {
                EnergySeries::Daily(Vec::new())
            } else {
                EnergySeries::Samples(Vec::new())
            });
        }

        if query.daily {
            let rows = sqlx::query_as::<_, DailyUsage>(
                "SELECT (recorded_at AT TIME ZONE 'UTC')::date AS day,
                        device_id,
                        SUM(usage_wh) AS usage_wh
                 FROM energy_usage
                 WHERE device_id = ANY($1)
                   AND ($2::timestamptz IS NULL OR recorded_at >= $2)
                   AND ($3::timestamptz IS NULL OR recorded_at <= $3)
                 GROUP BY 1, 2
                 ORDER BY 1, 2",
            )
            .bind(device_ids)
            .bind(query.from)
            .bind(query.to)
            .fetch_all(pool)
            .await?;
            Ok(EnergySeries::Daily(rows))
        } else {
            let rows = sqlx::query_as::<_, EnergySample>(
                "SELECT * FROM energy_usage
                 WHERE device_id = ANY($1)
                   AND ($2::timestamptz IS NULL OR recorded_at >= $2)
                   AND ($3::timestamptz IS NULL OR recorded_at <= $3)
                 ORDER BY recorded_at, device_id",
            )
            .bind(device_ids)
            .bind(query.from)
            .bind(query.to)
            .fetch_all(pool)
            .await?;
            Ok(EnergySeries::Samples(rows))
        }
    }
}
