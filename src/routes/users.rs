use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::permissions;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::User;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UpdateProfile {
    pub name: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

#[derive(Serialize)]
pub struct PermissionsResponse {
    pub permissions: Vec<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    permissions::require_permission(&state.pool, &auth, permissions::USERS_VIEW).await?;
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    permissions::require_permission(&state.pool, &auth, permissions::USERS_VIEW).await?;
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    let roles = db::rbac::list_role_names(&state.pool, auth.user_id).await?;
    Ok(Json(MeResponse { user, roles }))
}

pub async fn my_permissions(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<PermissionsResponse>, AppError> {
    let permissions = db::rbac::list_permissions(&state.pool, auth.user_id).await?;
    Ok(Json(PermissionsResponse { permissions }))
}

pub async fn update_me(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateProfile>,
) -> Result<Json<User>, AppError> {
    if req.name.trim().is_empty() || req.name.len() > 100 {
        return Err(AppError::BadRequest(
            "Name must be between 1 and 100 characters".to_string(),
        ));
    }

    let user = db::users::update_profile(&state.pool, auth.user_id, &req.name).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.updated",
        "user",
        Some(auth.user_id),
        None,
    )
    .await;

    Ok(Json(user))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_MANAGE_USERS).await?;

    if id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let removed = db::users::soft_delete(&state.pool, id).await?;
    if !removed {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    // A deleted user keeps no live sessions
    db::refresh_tokens::delete_all_for_user(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.deleted",
        "user",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
