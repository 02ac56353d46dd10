use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::permissions;
use crate::db;
use crate::error::{conflict_on_unique, AppError};
use crate::middleware::audit;
use crate::models::{Group, User};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub description: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateGroup {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddGroupMember {
    pub user_id: Uuid,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() || name.len() > 100 {
        return Err(AppError::BadRequest(
            "Group name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Group>>, AppError> {
    let groups = db::groups::list(&state.pool).await?;
    Ok(Json(groups))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateGroup>,
) -> Result<Json<Group>, AppError> {
    permissions::require_permission(&state.pool, &auth, permissions::GROUPS_MANAGE).await?;
    validate_name(&req.name)?;

    if let Some(project_id) = req.project_id {
        db::projects::find_by_id(&state.pool, project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    }

    let group = db::groups::create(
        &state.pool,
        &req.name,
        req.description.as_deref(),
        req.project_id,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "group.created",
        "group",
        Some(group.id),
        None,
    )
    .await;

    Ok(Json(group))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let group = db::groups::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;
    let members = db::groups::list_members(&state.pool, id).await?;

    Ok(Json(serde_json::json!({
        "group": group,
        "members": members,
    })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateGroup>,
) -> Result<Json<Group>, AppError> {
    permissions::require_permission(&state.pool, &auth, permissions::GROUPS_MANAGE).await?;
    validate_name(&req.name)?;

    db::groups::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

    let group = db::groups::update(&state.pool, id, &req.name, req.description.as_deref()).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "group.updated",
        "group",
        Some(group.id),
        None,
    )
    .await;

    Ok(Json(group))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    permissions::require_permission(&state.pool, &auth, permissions::GROUPS_MANAGE).await?;

    let removed = db::groups::soft_delete(&state.pool, id).await?;
    if !removed {
        return Err(AppError::NotFound("Group not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "group.deleted",
        "group",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn add_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddGroupMember>,
) -> Result<Json<serde_json::Value>, AppError> {
    permissions::require_permission(&state.pool, &auth, permissions::GROUPS_MANAGE).await?;

    db::groups::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

    db::users::find_by_id(&state.pool, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let member = db::groups::add_member(&state.pool, id, req.user_id)
        .await
        .map_err(|e| conflict_on_unique(e, "User is already a member of this group"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "group.member_added",
        "group",
        Some(id),
        Some(serde_json::json!({ "user_id": req.user_id })),
    )
    .await;

    Ok(Json(serde_json::json!({ "member": member })))
}

pub async fn remove_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    permissions::require_permission(&state.pool, &auth, permissions::GROUPS_MANAGE).await?;

    let removed = db::groups::remove_member(&state.pool, id, user_id).await?;
    if !removed {
        return Err(AppError::NotFound(
            "User is not a member of this group".to_string(),
        ));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "group.member_removed",
        "group",
        Some(id),
        Some(serde_json::json!({ "user_id": user_id })),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Removed" })))
}

pub async fn list_members(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, AppError> {
    db::groups::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;
    let members = db::groups::list_members(&state.pool, id).await?;
    Ok(Json(members))
}
