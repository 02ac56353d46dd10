use std::sync::LazyLock;

use axum::extract::{Path, State};
use axum::Json;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::permissions;
use crate::db;
use crate::error::{conflict_on_unique, AppError};
use crate::middleware::audit;
use crate::models::{Project, User};
use crate::state::SharedState;

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9]{1,9}$").unwrap());

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub key: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMember {
    pub user_id: Uuid,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() || name.len() > 100 {
        return Err(AppError::BadRequest(
            "Project name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_key(key: &str) -> Result<(), AppError> {
    if !KEY_RE.is_match(key) {
        return Err(AppError::BadRequest(
            "Project key must be 2-10 uppercase letters or digits, starting with a letter"
                .to_string(),
        ));
    }
    Ok(())
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = db::projects::list_for_member(&state.pool, auth.user_id).await?;
    Ok(Json(projects))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<Json<Project>, AppError> {
    permissions::require_permission(&state.pool, &auth, permissions::PROJECTS_CREATE).await?;
    validate_name(&req.name)?;
    validate_key(&req.key)?;

    let project = db::projects::create(
        &state.pool,
        &req.name,
        &req.key,
        req.description.as_deref(),
        auth.user_id,
    )
    .await
    .map_err(|e| conflict_on_unique(e, "A project with this key already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.created",
        "project",
        Some(project.id),
        None,
    )
    .await;

    Ok(Json(project))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    Ok(Json(project))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProject>,
) -> Result<Json<Project>, AppError> {
    validate_name(&req.name)?;

    let existing = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    permissions::require_owner_or_permission(
        &state.pool,
        &auth,
        existing.owner_id,
        permissions::PROJECTS_EDIT,
    )
    .await?;

    let project =
        db::projects::update(&state.pool, id, &req.name, req.description.as_deref()).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.updated",
        "project",
        Some(project.id),
        None,
    )
    .await;

    Ok(Json(project))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let existing = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    permissions::require_owner_or_permission(
        &state.pool,
        &auth,
        existing.owner_id,
        permissions::PROJECTS_DELETE,
    )
    .await?;

    db::projects::soft_delete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.deleted",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

// ── Members ─────────────────────────────────────────────────────

pub async fn list_members(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, AppError> {
    db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let members = db::project_members::list_users(&state.pool, id).await?;
    Ok(Json(members))
}

pub async fn add_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMember>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    permissions::require_owner_or_permission(
        &state.pool,
        &auth,
        project.owner_id,
        permissions::PROJECTS_EDIT,
    )
    .await?;

    db::users::find_by_id(&state.pool, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let member = db::project_members::add(&state.pool, id, req.user_id)
        .await
        .map_err(|e| conflict_on_unique(e, "User is already a member of this project"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.member_added",
        "project",
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
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    permissions::require_owner_or_permission(
        &state.pool,
        &auth,
        project.owner_id,
        permissions::PROJECTS_EDIT,
    )
    .await?;

    if user_id == project.owner_id {
        return Err(AppError::BadRequest(
            "The project owner cannot be removed".to_string(),
        ));
    }

    let removed = db::project_members::remove(&state.pool, id, user_id).await?;
    if !removed {
        return Err(AppError::NotFound(
            "User is not a member of this project".to_string(),
        ));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.member_removed",
        "project",
        Some(id),
        Some(serde_json::json!({ "user_id": user_id })),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Removed" })))
}
