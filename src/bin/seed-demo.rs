//! Demo dataset seed script
//!
//! Seeds a small, self-consistent dataset for local development:
//! - 4 accounts: 1 system admin, 1 parent, 1 admin, 1 children user
//! - 1 building ("hq") with two locations and three metering devices
//! - Role grants exercising every role, including a restricted children
//!   allowlist
//! - A week of hourly energy samples per assigned device
//!
//! Usage: DATABASE_URL=... seed-demo [--password PW] [--samples-days N]

use clap::Parser;
use rand::Rng;
use sqlx::postgres::PgPoolOptions;

use enerhub_api::models::location::location_id;

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed the enerhub database with demo data")]
struct Args {
    /// Password for all demo accounts
    #[arg(long, default_value = "Demo2024!")]
    password: String,

    /// How many days of energy samples to generate per device
    #[arg(long, default_value_t = 7)]
    samples_days: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    enerhub_api::db::run_migrations(&pool).await?;

    tracing::info!("Cleaning previous demo data...");
    for sql in [
        "DELETE FROM energy_usage WHERE device_id LIKE 'demo-%'",
        "DELETE FROM invitations WHERE building_id = 'hq'",
        "DELETE FROM user_buildings WHERE user_email LIKE '%@demo.enerhub.test'",
        "DELETE FROM devices WHERE id LIKE 'demo-%'",
        "DELETE FROM locations WHERE building_id = 'hq'",
        "DELETE FROM buildings WHERE id = 'hq'",
        "DELETE FROM push_tokens WHERE user_email LIKE '%@demo.enerhub.test'",
        "DELETE FROM users WHERE email LIKE '%@demo.enerhub.test'",
    ] {
        sqlx::query(sql).execute(&pool).await?;
    }

    let password_hash = bcrypt::hash(&args.password, 12)?;

    tracing::info!("Creating demo accounts...");
    let accounts = [
        ("sysadmin@demo.enerhub.test", "System Admin"),
        ("parent@demo.enerhub.test", "Pat Parent"),
        ("admin@demo.enerhub.test", "Adrian Admin"),
        ("child@demo.enerhub.test", "Casey Children"),
    ];
    for (email, name) in accounts {
        sqlx::query(
            "INSERT INTO users (email, display_name, password_hash) VALUES ($1, $2, $3)",
        )
        .bind(email)
        .bind(name)
        .bind(&password_hash)
        .execute(&pool)
        .await?;
    }

    tracing::info!("Creating demo building...");
    sqlx::query(
        "INSERT INTO buildings (id, name, address, description, created_by)
         VALUES ('hq', 'Headquarters', '1 Demo Street', 'Seeded demo building',
                 'parent@demo.enerhub.test')",
    )
    .execute(&pool)
    .await?;

    let lobby = location_id("hq", "Lobby");
    let server_room = location_id("hq", "Server Room");
    for (id, name) in [(&lobby, "Lobby"), (&server_room, "Server Room")] {
        sqlx::query("INSERT INTO locations (id, building_id, name) VALUES ($1, 'hq', $2)")
            .bind(id)
            .bind(name)
            .execute(&pool)
            .await?;
    }

    let devices = [
        ("demo-meter-001", Some(&lobby)),
        ("demo-meter-002", Some(&server_room)),
        ("demo-meter-003", None),
    ];
    for (id, loc) in &devices {
        sqlx::query("INSERT INTO devices (id, location_id) VALUES ($1, $2)")
            .bind(id)
            .bind(loc.map(|l| l.as_str()))
            .execute(&pool)
            .await?;
    }

    tracing::info!("Granting roles...");
    let grants: [(&str, &str, &str, Vec<&str>); 4] = [
        ("sysadmin@demo.enerhub.test", "SystemAdmin", "admin", vec![]),
        ("parent@demo.enerhub.test", "hq", "parent", vec![]),
        ("admin@demo.enerhub.test", "hq", "admin", vec![]),
        ("child@demo.enerhub.test", "hq", "children", vec![lobby.as_str()]),
    ];
    for (email, building, role, assigned) in grants {
        sqlx::query(
            "INSERT INTO user_buildings (user_email, building_id, role, assigned_locations)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(email)
        .bind(building)
        .bind(role)
        .bind(&assigned.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        .execute(&pool)
        .await?;
    }

    tracing::info!("Generating {} days of energy samples...", args.samples_days);
    let mut rng = rand::thread_rng();
    let now = chrono::Utc::now();
    for (device, loc) in &devices {
        if loc.is_none() {
            continue;
        }
        for hour in 0..(args.samples_days * 24) {
            let recorded_at = now - chrono::Duration::hours(hour);
            let usage_wh: f64 = rng.gen_range(50.0..400.0);
            sqlx::query(
                "INSERT INTO energy_usage (device_id, usage_wh, recorded_at)
                 VALUES ($1, $2, $3)",
            )
            .bind(device)
            .bind(usage_wh)
            .bind(recorded_at)
            .execute(&pool)
            .await?;
        }
    }

    tracing::info!("Demo data seeded. Accounts use password '{}'", args.password);
    Ok(())
}
