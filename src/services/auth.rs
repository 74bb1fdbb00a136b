use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::auth::{Claims, LoginResponse, RefreshClaims};
use crate::models::user::{is_valid_email, RegisterRequest, User, UserProfile};
use crate::services::metrics;

pub struct AuthService;

impl AuthService {
    pub async fn register(pool: &PgPool, req: &RegisterRequest) -> Result<UserProfile, ApiError> {
        let email = req.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::Validation("Malformed email address".into()));
        }
        if req.display_name.trim().is_empty() {
            return Err(ApiError::Validation("Display name is required".into()));
        }
        if req.password.len() < 8 {
            return Err(ApiError::Validation(
                "Password must be at least 8 characters".into(),
            ));
        }

        let password_hash = bcrypt::hash(&req.password, 12)
            .map_err(|e| ApiError::Internal(format!("Hashing failed: {e}")))?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, display_name, contact_number, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&email)
        .bind(req.display_name.trim())
        .bind(&req.contact_number)
        .bind(&password_hash)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                ApiError::Conflict("An account with this email already exists".into())
            }
            other => other.into(),
        })?;

        Ok(user.into())
    }

    pub async fn login(
        pool: &PgPool,
        config: &Config,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiError> {
        let email = email.trim().to_lowercase();
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(pool)
            .await?;

        // Same rejection whether the account is missing or the password is
        // wrong, so login is not an account-existence oracle.
        let Some(user) = user else {
            metrics::LOGINS_COUNTER.with_label_values(&["failure"]).inc();
            return Err(ApiError::Unauthorized("Invalid email or password".into()));
        };
        let ok = bcrypt::verify(password, &user.password_hash).unwrap_or(false);
        if !ok {
            metrics::LOGINS_COUNTER.with_label_values(&["failure"]).inc();
            return Err(ApiError::Unauthorized("Invalid email or password".into()));
        }

        let access_token = Self::issue_access_token(config, &user.email)?;
        let refresh_token = Self::issue_refresh_token(config, &user.email)?;
        metrics::LOGINS_COUNTER.with_label_values(&["success"]).inc();

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: user.into(),
        })
    }

    /// Exchange a valid refresh token for a fresh access token.
    pub async fn refresh(
        pool: &PgPool,
        config: &Config,
        refresh_token: &str,
    ) -> Result<LoginResponse, ApiError> {
        let key = DecodingKey::from_secret(config.jwt_refresh_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<RefreshClaims>(refresh_token, &key, &validation)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token".into()))?;

        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(&data.claims.sub)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".into()))?;

        let access_token = Self::issue_access_token(config, &user.email)?;
        let refresh_token = Self::issue_refresh_token(config, &user.email)?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: user.into(),
        })
    }

    pub async fn profile(pool: &PgPool, email: &str) -> Result<UserProfile, ApiError> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        Ok(user.into())
    }

    fn issue_access_token(config: &Config, email: &str) -> Result<String, ApiError> {
        let iat = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: email.to_string(),
            iat,
            exp: iat + config.jwt_expiry_seconds as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Token encoding failed: {e}")))
    }

    fn issue_refresh_token(config: &Config, email: &str) -> Result<String, ApiError> {
        let iat = Utc::now().timestamp() as usize;
        let claims = RefreshClaims {
            sub: email.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat,
            exp: iat + (config.jwt_refresh_expiry_days * 24 * 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Token encoding failed: {e}")))
    }
}
