use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::permissions;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Comment;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateComment {
    pub content: String,
}

#[derive(Deserialize)]
pub struct UpdateComment {
    pub content: String,
}

fn validate_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() || content.len() > 5000 {
        return Err(AppError::BadRequest(
            "Comment content must be between 1 and 5000 characters".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_by_work_item(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(work_item_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, AppError> {
    db::work_items::find_by_id(&state.pool, work_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Work item not found".to_string()))?;
    let comments = db::comments::list_by_work_item(&state.pool, work_item_id).await?;
    Ok(Json(comments))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(work_item_id): Path<Uuid>,
    Json(req): Json<CreateComment>,
) -> Result<Json<Comment>, AppError> {
    validate_content(&req.content)?;

    db::work_items::find_by_id(&state.pool, work_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Work item not found".to_string()))?;

    let comment =
        db::comments::create(&state.pool, work_item_id, Some(auth.user_id), &req.content).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "comment.created",
        "comment",
        Some(comment.id),
        None,
    )
    .await;

    Ok(Json(comment))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateComment>,
) -> Result<Json<Comment>, AppError> {
    validate_content(&req.content)?;

    let existing = db::comments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    // The author may edit their own comment; anyone else needs edit rights.
    if existing.author_id != Some(auth.user_id) {
        permissions::require_permission(&state.pool, &auth, permissions::WORK_ITEMS_EDIT).await?;
    }

    let comment = db::comments::update(&state.pool, id, &req.content).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "comment.updated",
        "comment",
        Some(comment.id),
        None,
    )
    .await;

    Ok(Json(comment))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let existing = db::comments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if existing.author_id != Some(auth.user_id) {
        permissions::require_permission(&state.pool, &auth, permissions::WORK_ITEMS_EDIT).await?;
    }

    db::comments::soft_delete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "comment.deleted",
        "comment",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
