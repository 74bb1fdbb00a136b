use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::ApiError,
    models::auth::{AuthenticatedUser, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterPushTokenRequest},
    models::user::{RegisterRequest, UserProfile},
    services::auth::AuthService,
    services::notifications::NotificationService,
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let profile = AuthService::register(&state.db, &body).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = AuthService::login(&state.db, &state.config, &body.email, &body.password).await?;
    Ok(Json(response))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = AuthService::refresh(&state.db, &state.config, &body.refresh_token).await?;
    Ok(Json(response))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = AuthService::profile(&state.db, &user.email).await?;
    Ok(Json(profile))
}

pub async fn register_push_token(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<RegisterPushTokenRequest>,
) -> Result<StatusCode, ApiError> {
    NotificationService::register_push_token(&state.db, &user.email, &body.platform, &body.token)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
