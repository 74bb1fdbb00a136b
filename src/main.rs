use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enerhub_api::config::Config;
use enerhub_api::middleware::auth::JwtSecret;
use enerhub_api::services::email::EmailService;
use enerhub_api::services::metrics;
use enerhub_api::services::notifications::NotificationService;
use enerhub_api::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let notifications = Arc::new(NotificationService::new(config.fcm_api_key.clone()));

    let email = EmailService::new(&config).map(Arc::new);
    if email.is_some() {
        info!("SMTP email service configured");
    } else {
        info!("SMTP not configured — email features disabled");
    }

    metrics::start(pool.clone());

    let state = AppState {
        db: pool,
        config: config.clone(),
        notifications,
        email,
    };

    // CORS: allow the configured dashboard origin; localhost is always
    // allowed for development.
    let base_url = config.app_base_url.clone();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let o = match origin.to_str() {
            Ok(s) => s,
            Err(_) => return false,
        };
        o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") || o == base_url
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(config.jwt_secret.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Auth
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh_token))
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/push-token", post(routes::auth::register_push_token))
        // Buildings
        .route("/buildings", get(routes::buildings::list_buildings).post(routes::buildings::create_building))
        .route("/buildings/{id}", get(routes::buildings::get_building).put(routes::buildings::update_building).delete(routes::buildings::delete_building))
        // Locations
        .route("/buildings/{id}/locations", get(routes::locations::list_locations).post(routes::locations::create_location))
        .route("/buildings/{id}/locations/{location_id}", delete(routes::locations::delete_location))
        // Devices
        .route("/buildings/{id}/devices", get(routes::devices::list_building_devices))
        .route("/buildings/{id}/devices/{device_id}", put(routes::devices::assign_device))
        .route("/devices", post(routes::devices::register_device))
        .route("/devices/unassigned", get(routes::devices::list_unassigned_devices))
        // Members
        .route("/buildings/{id}/members", get(routes::members::list_members))
        .route("/buildings/{id}/members/{email}", put(routes::members::set_assigned_locations).delete(routes::members::remove_member))
        // Invitations
        .route("/buildings/{id}/invitations", get(routes::invitations::list_building_invitations).post(routes::invitations::create_invitation))
        .route("/invitations", get(routes::invitations::list_my_invitations))
        .route("/invitations/{id}/accept", post(routes::invitations::accept_invitation))
        .route("/invitations/{id}/decline", post(routes::invitations::decline_invitation))
        // Energy
        .route("/buildings/{id}/energy", get(routes::energy::building_energy))
        // Users
        .route("/users/me", put(routes::users::update_profile))
        .route("/users/{email}", get(routes::users::get_user))
        .route("/users/{email}/buildings", get(routes::users::get_user_buildings))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("enerhub API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
