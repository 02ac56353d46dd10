use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Document;

pub async fn create(
    pool: &PgPool,
    project_id: Uuid,
    author_id: Option<Uuid>,
    title: &str,
    content: &str,
    category: &str,
) -> Result<Document, sqlx::Error> {
    sqlx::query_as::<_, Document>(
        "INSERT INTO documents (project_id, author_id, title, content, category)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(project_id)
    .bind(author_id)
    .bind(title)
    .bind(content)
    .bind(category)
    .fetch_one(pool)
    .await
}

pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Document>, sqlx::Error> {
    sqlx::query_as::<_, Document>(
        "SELECT * FROM documents WHERE project_id = $1 AND NOT is_deleted
         ORDER BY created_at DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Document>, sqlx::Error> {
    sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1 AND NOT is_deleted")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    content: &str,
    category: &str,
) -> Result<Document, sqlx::Error> {
    sqlx::query_as::<_, Document>(
        "UPDATE documents SET title = $2, content = $3, category = $4, updated_at = now()
         WHERE id = $1 AND NOT is_deleted RETURNING *",
    )
    .bind(id)
    .bind(title)
    .bind(content)
    .bind(category)
    .fetch_one(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE documents SET is_deleted = TRUE, updated_at = now()
         WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
