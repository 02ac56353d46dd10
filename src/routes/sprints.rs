use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::permissions;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Sprint, WorkItem};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateSprint {
    pub name: String,
    pub goal: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateSprint {
    pub name: String,
    pub goal: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

fn validate_sprint(
    name: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if name.trim().is_empty() || name.len() > 100 {
        return Err(AppError::BadRequest(
            "Sprint name must be between 1 and 100 characters".to_string(),
        ));
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::BadRequest(
                "Sprint end date cannot be before its start date".to_string(),
            ));
        }
    }
    Ok(())
}

async fn require_sprint_manage(
    pool: &PgPool,
    auth: &AuthUser,
    project_id: Uuid,
) -> Result<(), AppError> {
    let project = db::projects::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    permissions::require_owner_or_permission(
        pool,
        auth,
        project.owner_id,
        permissions::SPRINTS_MANAGE,
    )
    .await
}

pub async fn list_by_project(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Sprint>>, AppError> {
    db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let sprints = db::sprints::list_by_project(&state.pool, project_id).await?;
    Ok(Json(sprints))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateSprint>,
) -> Result<Json<Sprint>, AppError> {
    validate_sprint(&req.name, req.start_date, req.end_date)?;
    require_sprint_manage(&state.pool, &auth, project_id).await?;

    let sprint = db::sprints::create(
        &state.pool,
        project_id,
        &req.name,
        req.goal.as_deref(),
        req.start_date,
        req.end_date,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "sprint.created",
        "sprint",
        Some(sprint.id),
        None,
    )
    .await;

    Ok(Json(sprint))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Sprint>, AppError> {
    let sprint = db::sprints::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sprint not found".to_string()))?;
    Ok(Json(sprint))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSprint>,
) -> Result<Json<Sprint>, AppError> {
    validate_sprint(&req.name, req.start_date, req.end_date)?;

    let existing = db::sprints::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sprint not found".to_string()))?;

    require_sprint_manage(&state.pool, &auth, existing.project_id).await?;

    let sprint = db::sprints::update(
        &state.pool,
        id,
        &req.name,
        req.goal.as_deref(),
        req.start_date,
        req.end_date,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "sprint.updated",
        "sprint",
        Some(sprint.id),
        None,
    )
    .await;

    Ok(Json(sprint))
}

pub async fn start(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Sprint>, AppError> {
    let existing = db::sprints::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sprint not found".to_string()))?;

    require_sprint_manage(&state.pool, &auth, existing.project_id).await?;

    if existing.is_completed {
        return Err(AppError::BadRequest(
            "A completed sprint cannot be started".to_string(),
        ));
    }

    let sprint = db::sprints::set_active(&state.pool, id, true).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "sprint.started",
        "sprint",
        Some(id),
        None,
    )
    .await;

    Ok(Json(sprint))
}

pub async fn complete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Sprint>, AppError> {
    let existing = db::sprints::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sprint not found".to_string()))?;

    require_sprint_manage(&state.pool, &auth, existing.project_id).await?;

    let sprint = db::sprints::complete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "sprint.completed",
        "sprint",
        Some(id),
        None,
    )
    .await;

    Ok(Json(sprint))
}

pub async fn list_work_items(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<WorkItem>>, AppError> {
    db::sprints::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sprint not found".to_string()))?;
    let items = db::work_items::list_by_sprint(&state.pool, id).await?;
    Ok(Json(items))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let existing = db::sprints::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sprint not found".to_string()))?;

    require_sprint_manage(&state.pool, &auth, existing.project_id).await?;

    db::sprints::soft_delete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "sprint.deleted",
        "sprint",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
