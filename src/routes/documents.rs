use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::permissions;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Document;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateDocument {
    pub title: String,
    pub content: String,
    pub category: String,
}

#[derive(Deserialize)]
pub struct UpdateDocument {
    pub title: String,
    pub content: String,
    pub category: String,
}

fn validate_document(title: &str, category: &str) -> Result<(), AppError> {
    if title.trim().is_empty() || title.len() > 200 {
        return Err(AppError::BadRequest(
            "Document title must be between 1 and 200 characters".to_string(),
        ));
    }
    if category.trim().is_empty() || category.len() > 50 {
        return Err(AppError::BadRequest(
            "Document category must be between 1 and 50 characters".to_string(),
        ));
    }
    Ok(())
}

async fn require_document_manage(
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
        permissions::DOCUMENTS_MANAGE,
    )
    .await
}

pub async fn list_by_project(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, AppError> {
    db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let documents = db::documents::list_by_project(&state.pool, project_id).await?;
    Ok(Json(documents))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateDocument>,
) -> Result<Json<Document>, AppError> {
    validate_document(&req.title, &req.category)?;
    require_document_manage(&state.pool, &auth, project_id).await?;

    let document = db::documents::create(
        &state.pool,
        project_id,
        Some(auth.user_id),
        &req.title,
        &req.content,
        &req.category,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "document.created",
        "document",
        Some(document.id),
        None,
    )
    .await;

    Ok(Json(document))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, AppError> {
    let document = db::documents::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;
    Ok(Json(document))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDocument>,
) -> Result<Json<Document>, AppError> {
    validate_document(&req.title, &req.category)?;

    let existing = db::documents::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    require_document_manage(&state.pool, &auth, existing.project_id).await?;

    let document =
        db::documents::update(&state.pool, id, &req.title, &req.content, &req.category).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "document.updated",
        "document",
        Some(document.id),
        None,
    )
    .await;

    Ok(Json(document))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let existing = db::documents::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    require_document_manage(&state.pool, &auth, existing.project_id).await?;

    db::documents::soft_delete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "document.deleted",
        "document",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
