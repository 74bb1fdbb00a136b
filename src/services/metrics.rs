use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Gauge, GaugeVec};
use sqlx::PgPool;
use tracing::{info, warn};

lazy_static! {
    // ── Event counters ──────────────────────────────────────────────────────
    pub static ref LOGINS_COUNTER: CounterVec = register_counter_vec!(
        "api_logins_total",
        "Login attempts by status",
        &["status"]
    ).unwrap();

    pub static ref INVITATIONS_COUNTER: CounterVec = register_counter_vec!(
        "api_invitations_total",
        "Invitations created per building",
        &["building"]
    ).unwrap();

    // ── Business gauges ─────────────────────────────────────────────────────
    pub static ref BUILDINGS_GAUGE: Gauge = register_gauge!(
        "enerhub_buildings_total",
        "Registered buildings"
    ).unwrap();

    pub static ref USERS_GAUGE: Gauge = register_gauge!(
        "enerhub_users_total",
        "Registered accounts"
    ).unwrap();

    pub static ref MEMBERSHIPS_GAUGE: GaugeVec = register_gauge_vec!(
        "enerhub_memberships_total",
        "Building memberships by role",
        &["role"]
    ).unwrap();

    pub static ref DEVICES_GAUGE: GaugeVec = register_gauge_vec!(
        "enerhub_devices_total",
        "Devices by assignment state",
        &["state"]
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    let buildings: i64 = sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM buildings")
        .fetch_one(pool)
        .await?;
    BUILDINGS_GAUGE.set(buildings as f64);

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM users")
        .fetch_one(pool)
        .await?;
    USERS_GAUGE.set(users as f64);

    let memberships: Vec<(String, i64)> = sqlx::query_as(
        "SELECT role, COUNT(*)::BIGINT FROM user_buildings GROUP BY role",
    )
    .fetch_all(pool)
    .await
    .unwrap_or_default();
    for (role, count) in memberships {
        MEMBERSHIPS_GAUGE.with_label_values(&[&role]).set(count as f64);
    }

    let assigned: i64 =
        sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM devices WHERE location_id IS NOT NULL")
            .fetch_one(pool)
            .await?;
    let unassigned: i64 =
        sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM devices WHERE location_id IS NULL")
            .fetch_one(pool)
            .await?;
    DEVICES_GAUGE.with_label_values(&["assigned"]).set(assigned as f64);
    DEVICES_GAUGE.with_label_values(&["unassigned"]).set(unassigned as f64);

    info!("Metrics: collected ({} buildings, {} users)", buildings, users);
    Ok(())
}
