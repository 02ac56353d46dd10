use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{encode_token, Claims};
use crate::auth::password;
use crate::db;
use crate::error::{conflict_on_unique, AppError};
use crate::middleware::audit;
use crate::models::User;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn auth_cookies(access_token: &str, refresh_token: &str) -> CookieJar {
    let access = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(15))
        .build();

    let refresh = Cookie::build(("refresh_token", refresh_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(7))
        .build();

    CookieJar::new().add(access).add(refresh)
}

fn clear_auth_cookies() -> CookieJar {
    let access = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build(("refresh_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let ok = email.len() <= 254
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if ok {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid email address".to_string()))
    }
}

async fn issue_tokens(
    state: &SharedState,
    user: &User,
) -> Result<(String, String), AppError> {
    let claims = Claims::new(user.id, user.email.clone());
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh = generate_refresh_token();
    let refresh_hash = hash_token(&refresh);
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &refresh_hash,
        Utc::now() + Duration::days(7),
    )
    .await?;

    Ok((access_token, refresh))
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    if req.email.is_empty() || req.password.is_empty() || req.name.is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }
    validate_email(&req.email)?;

    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Advisory lock so exactly one concurrent bootstrap registration
    // observes the empty table and receives the Admin role.
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    let count = db::users::count_all(&mut *tx).await?;

    let user = db::users::create(&mut *tx, &req.email, &req.name, &pw_hash)
        .await
        .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))?;

    let bootstrap_role = if count == 0 { "Admin" } else { "Member" };
    let role: (uuid::Uuid,) =
        sqlx::query_as("SELECT id FROM roles WHERE name = $1 AND NOT is_deleted")
            .bind(bootstrap_role)
            .fetch_one(&mut *tx)
            .await?;
    db::rbac::assign_role(&mut *tx, user.id, role.0).await?;

    tx.commit().await?;

    let (access_token, refresh) = issue_tokens(&state, &user).await?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.registered",
        "user",
        Some(user.id),
        None,
    )
    .await;

    let jar = auth_cookies(&access_token, &refresh);
    Ok((
        jar,
        Json(AuthResponse {
            access_token,
            refresh_token: refresh,
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    if state.login_limiter.check(&req.email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let user = db::users::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        state.login_limiter.record_failure(&req.email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    state.login_limiter.record_success(&req.email);

    let (access_token, refresh) = issue_tokens(&state, &user).await?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.login",
        "user",
        Some(user.id),
        None,
    )
    .await;

    let jar = auth_cookies(&access_token, &refresh);
    Ok((
        jar,
        Json(AuthResponse {
            access_token,
            refresh_token: refresh,
            user,
        }),
    ))
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let refresh_value = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let token_hash = hash_token(&refresh_value);

    let stored = db::refresh_tokens::find_by_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if stored.used {
        tracing::warn!(
            "Refresh token reuse detected for user {}. Revoking all sessions.",
            stored.user_id
        );
        db::refresh_tokens::delete_all_for_user(&state.pool, stored.user_id).await?;
        return Err(AppError::Unauthorized(
            "Refresh token reuse detected. All sessions revoked.".to_string(),
        ));
    }

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    db::refresh_tokens::mark_used(&state.pool, stored.id).await?;

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let (access_token, new_refresh) = issue_tokens(&state, &user).await?;

    let new_jar = auth_cookies(&access_token, &new_refresh);
    Ok((
        new_jar,
        Json(AuthResponse {
            access_token,
            refresh_token: new_refresh,
            user,
        }),
    ))
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        let token_hash = hash_token(cookie.value());
        db::refresh_tokens::delete_by_hash(&state.pool, &token_hash).await?;
    }

    Ok((
        clear_auth_cookies(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    if req.new_password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let valid =
        password::verify(&req.current_password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    // Every existing session is revoked on password change
    db::refresh_tokens::delete_all_for_user(&state.pool, user.id).await?;

    let (access_token, refresh) = issue_tokens(&state, &user).await?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.password_changed",
        "user",
        Some(user.id),
        None,
    )
    .await;

    let jar = auth_cookies(&access_token, &refresh);
    Ok((
        jar,
        Json(AuthResponse {
            access_token,
            refresh_token: refresh,
            user,
        }),
    ))
}
