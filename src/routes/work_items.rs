use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::permissions;
use crate::db;
use crate::db::work_items::{NewWorkItem, WorkItemChanges};
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Project, WorkItem, WorkItemPriority, WorkItemStatus, WorkItemType};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateWorkItem {
    pub title: String,
    pub description: Option<String>,
    pub item_type: WorkItemType,
    pub status: Option<WorkItemStatus>,
    pub priority: Option<WorkItemPriority>,
    pub story_points: Option<i32>,
    pub time_spent_minutes: Option<i32>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub sprint_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateWorkItem {
    pub title: String,
    pub description: Option<String>,
    pub item_type: WorkItemType,
    pub status: WorkItemStatus,
    pub priority: WorkItemPriority,
    pub story_points: Option<i32>,
    pub time_spent_minutes: Option<i32>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub sprint_id: Option<Uuid>,
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() || title.len() > 200 {
        return Err(AppError::BadRequest(
            "Title must be between 1 and 200 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_points(story_points: Option<i32>, time_spent: Option<i32>) -> Result<(), AppError> {
    if story_points.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest(
            "Story points cannot be negative".to_string(),
        ));
    }
    if time_spent.is_some_and(|m| m < 0) {
        return Err(AppError::BadRequest(
            "Time spent cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Referenced users must exist; parent and sprint must belong to the same
/// project as the item itself.
async fn validate_references(
    pool: &PgPool,
    project_id: Uuid,
    item_id: Option<Uuid>,
    assignee_id: Option<Uuid>,
    reporter_id: Option<Uuid>,
    parent_id: Option<Uuid>,
    sprint_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(assignee) = assignee_id {
        db::users::find_by_id(pool, assignee)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignee not found".to_string()))?;
    }
    if let Some(reporter) = reporter_id {
        db::users::find_by_id(pool, reporter)
            .await?
            .ok_or_else(|| AppError::NotFound("Reporter not found".to_string()))?;
    }
    if let Some(parent) = parent_id {
        if item_id == Some(parent) {
            return Err(AppError::BadRequest(
                "A work item cannot be its own parent".to_string(),
            ));
        }
        let parent_item = db::work_items::find_by_id(pool, parent)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent work item not found".to_string()))?;
        if parent_item.project_id != project_id {
            return Err(AppError::BadRequest(
                "Parent work item belongs to a different project".to_string(),
            ));
        }
    }
    if let Some(sprint) = sprint_id {
        let sprint_row = db::sprints::find_by_id(pool, sprint)
            .await?
            .ok_or_else(|| AppError::NotFound("Sprint not found".to_string()))?;
        if sprint_row.project_id != project_id {
            return Err(AppError::BadRequest(
                "Sprint belongs to a different project".to_string(),
            ));
        }
    }
    Ok(())
}

async fn find_project(pool: &PgPool, id: Uuid) -> Result<Project, AppError> {
    db::projects::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

pub async fn list_by_project(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<WorkItem>>, AppError> {
    find_project(&state.pool, project_id).await?;
    let items = db::work_items::list_by_project(&state.pool, project_id).await?;
    Ok(Json(items))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateWorkItem>,
) -> Result<Json<WorkItem>, AppError> {
    validate_title(&req.title)?;
    validate_points(req.story_points, req.time_spent_minutes)?;

    // Unknown project fails before anything is persisted
    let project = find_project(&state.pool, project_id).await?;

    permissions::require_owner_or_permission(
        &state.pool,
        &auth,
        project.owner_id,
        permissions::WORK_ITEMS_CREATE,
    )
    .await?;

    validate_references(
        &state.pool,
        project_id,
        None,
        req.assignee_id,
        req.reporter_id,
        req.parent_id,
        req.sprint_id,
    )
    .await?;

    let item = db::work_items::create(
        &state.pool,
        NewWorkItem {
            project_id,
            title: &req.title,
            description: req.description.as_deref(),
            item_type: req.item_type,
            status: req.status.unwrap_or(WorkItemStatus::Todo),
            priority: req.priority.unwrap_or(WorkItemPriority::Medium),
            story_points: req.story_points,
            time_spent_minutes: req.time_spent_minutes,
            assignee_id: req.assignee_id,
            reporter_id: req.reporter_id.or(Some(auth.user_id)),
            parent_id: req.parent_id,
            sprint_id: req.sprint_id,
        },
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "work_item.created",
        "work_item",
        Some(item.id),
        None,
    )
    .await;

    Ok(Json(item))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkItem>, AppError> {
    let item = db::work_items::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Work item not found".to_string()))?;
    Ok(Json(item))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateWorkItem>,
) -> Result<Json<WorkItem>, AppError> {
    validate_title(&req.title)?;
    validate_points(req.story_points, req.time_spent_minutes)?;

    let existing = db::work_items::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Work item not found".to_string()))?;

    let project = find_project(&state.pool, existing.project_id).await?;

    permissions::require_owner_or_permission(
        &state.pool,
        &auth,
        project.owner_id,
        permissions::WORK_ITEMS_EDIT,
    )
    .await?;

    validate_references(
        &state.pool,
        existing.project_id,
        Some(id),
        req.assignee_id,
        req.reporter_id,
        req.parent_id,
        req.sprint_id,
    )
    .await?;

    let item = db::work_items::update(
        &state.pool,
        id,
        WorkItemChanges {
            title: &req.title,
            description: req.description.as_deref(),
            item_type: req.item_type,
            status: req.status,
            priority: req.priority,
            story_points: req.story_points,
            time_spent_minutes: req.time_spent_minutes,
            assignee_id: req.assignee_id,
            reporter_id: req.reporter_id,
            parent_id: req.parent_id,
            sprint_id: req.sprint_id,
        },
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "work_item.updated",
        "work_item",
        Some(item.id),
        None,
    )
    .await;

    Ok(Json(item))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let existing = db::work_items::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Work item not found".to_string()))?;

    let project = find_project(&state.pool, existing.project_id).await?;

    permissions::require_owner_or_permission(
        &state.pool,
        &auth,
        project.owner_id,
        permissions::WORK_ITEMS_DELETE,
    )
    .await?;

    db::work_items::soft_delete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "work_item.deleted",
        "work_item",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
