use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::permissions;
use crate::db;
use crate::error::{conflict_on_unique, AppError};
use crate::middleware::audit;
use crate::models::{AuditEvent, Permission, Role};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateRole {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePermission {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct GrantPermission {
    pub permission_id: Uuid,
}

#[derive(Deserialize)]
pub struct AssignRole {
    pub role_id: Uuid,
}

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Every admin endpoint sits behind the admin-panel gate; role and
/// assignment mutations additionally need their own permission.
async fn require_admin(pool: &PgPool, auth: &AuthUser) -> Result<(), AppError> {
    permissions::require_permission(pool, auth, permissions::ADMIN_ACCESS).await
}

fn validate_name(name: &str, what: &str) -> Result<(), AppError> {
    if name.trim().is_empty() || name.len() > 100 {
        return Err(AppError::BadRequest(format!(
            "{what} name must be between 1 and 100 characters"
        )));
    }
    Ok(())
}

// ── Roles ───────────────────────────────────────────────────────

pub async fn list_roles(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Role>>, AppError> {
    require_admin(&state.pool, &auth).await?;
    let roles = db::rbac::list_roles(&state.pool).await?;
    Ok(Json(roles))
}

pub async fn create_role(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateRole>,
) -> Result<Json<Role>, AppError> {
    require_admin(&state.pool, &auth).await?;
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_MANAGE_ROLES).await?;
    validate_name(&req.name, "Role")?;

    let role = db::rbac::create_role(&state.pool, &req.name, req.description.as_deref())
        .await
        .map_err(|e| conflict_on_unique(e, "A role with this name already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "role.created",
        "role",
        Some(role.id),
        None,
    )
    .await;

    Ok(Json(role))
}

pub async fn update_role(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRole>,
) -> Result<Json<Role>, AppError> {
    require_admin(&state.pool, &auth).await?;
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_MANAGE_ROLES).await?;
    validate_name(&req.name, "Role")?;

    db::rbac::find_role_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;

    let role = db::rbac::update_role(&state.pool, id, &req.name, req.description.as_deref())
        .await
        .map_err(|e| conflict_on_unique(e, "A role with this name already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "role.updated",
        "role",
        Some(role.id),
        None,
    )
    .await;

    Ok(Json(role))
}

pub async fn delete_role(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state.pool, &auth).await?;
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_MANAGE_ROLES).await?;

    let removed = db::rbac::soft_delete_role(&state.pool, id).await?;
    if !removed {
        return Err(AppError::NotFound("Role not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "role.deleted",
        "role",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

// ── Permissions ─────────────────────────────────────────────────

pub async fn list_permissions(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Permission>>, AppError> {
    require_admin(&state.pool, &auth).await?;
    let perms = db::rbac::list_all_permissions(&state.pool).await?;
    Ok(Json(perms))
}

pub async fn create_permission(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreatePermission>,
) -> Result<Json<Permission>, AppError> {
    require_admin(&state.pool, &auth).await?;
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_MANAGE_ROLES).await?;
    validate_name(&req.name, "Permission")?;

    let perm = db::rbac::create_permission(&state.pool, &req.name, req.description.as_deref())
        .await
        .map_err(|e| conflict_on_unique(e, "A permission with this name already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "permission.created",
        "permission",
        Some(perm.id),
        None,
    )
    .await;

    Ok(Json(perm))
}

// ── Role-permission links ───────────────────────────────────────

pub async fn list_role_permissions(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Permission>>, AppError> {
    require_admin(&state.pool, &auth).await?;

    db::rbac::find_role_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;

    let perms = db::rbac::list_permissions_for_role(&state.pool, id).await?;
    Ok(Json(perms))
}

pub async fn grant_permission(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<GrantPermission>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state.pool, &auth).await?;
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_MANAGE_ROLES).await?;

    db::rbac::find_role_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;
    db::rbac::find_permission_by_id(&state.pool, req.permission_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Permission not found".to_string()))?;

    let link = db::rbac::grant_permission(&state.pool, id, req.permission_id)
        .await
        .map_err(|e| conflict_on_unique(e, "Role already has this permission"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "role.permission_granted",
        "role",
        Some(id),
        Some(serde_json::json!({ "permission_id": req.permission_id })),
    )
    .await;

    Ok(Json(serde_json::json!({ "link": link })))
}

pub async fn revoke_permission(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state.pool, &auth).await?;
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_MANAGE_ROLES).await?;

    let removed = db::rbac::revoke_permission(&state.pool, id, permission_id).await?;
    if !removed {
        return Err(AppError::NotFound(
            "Role does not have this permission".to_string(),
        ));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "role.permission_revoked",
        "role",
        Some(id),
        Some(serde_json::json!({ "permission_id": permission_id })),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Revoked" })))
}

// ── User-role assignments ───────────────────────────────────────

pub async fn list_user_roles(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Role>>, AppError> {
    require_admin(&state.pool, &auth).await?;

    db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let roles = db::rbac::list_roles_for_user(&state.pool, id).await?;
    Ok(Json(roles))
}

pub async fn assign_role(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRole>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state.pool, &auth).await?;
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_MANAGE_USERS).await?;

    db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    db::rbac::find_role_by_id(&state.pool, req.role_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;

    let assignment = db::rbac::assign_role(&state.pool, id, req.role_id)
        .await
        .map_err(|e| conflict_on_unique(e, "User already has this role"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.role_assigned",
        "user",
        Some(id),
        Some(serde_json::json!({ "role_id": req.role_id })),
    )
    .await;

    Ok(Json(serde_json::json!({ "assignment": assignment })))
}

pub async fn remove_role(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state.pool, &auth).await?;
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_MANAGE_USERS).await?;

    let removed = db::rbac::remove_role(&state.pool, id, role_id).await?;
    if !removed {
        return Err(AppError::NotFound(
            "User does not have this role".to_string(),
        ));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.role_removed",
        "user",
        Some(id),
        Some(serde_json::json!({ "role_id": role_id })),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Removed" })))
}

// ── Audit log ───────────────────────────────────────────────────

pub async fn list_audit_events(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEvent>>, AppError> {
    require_admin(&state.pool, &auth).await?;
    permissions::require_permission(&state.pool, &auth, permissions::ADMIN_VIEW_AUDIT_LOG).await?;

    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    let events = db::audit::list(&state.pool, limit, offset).await?;
    Ok(Json(events))
}
