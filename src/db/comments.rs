use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Comment;

pub async fn create(
    pool: &PgPool,
    work_item_id: Uuid,
    author_id: Option<Uuid>,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (work_item_id, author_id, content)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(work_item_id)
    .bind(author_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn list_by_work_item(
    pool: &PgPool,
    work_item_id: Uuid,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE work_item_id = $1 AND NOT is_deleted
         ORDER BY created_at",
    )
    .bind(work_item_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1 AND NOT is_deleted")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(pool: &PgPool, id: Uuid, content: &str) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "UPDATE comments SET content = $2, updated_at = now()
         WHERE id = $1 AND NOT is_deleted RETURNING *",
    )
    .bind(id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE comments SET is_deleted = TRUE, updated_at = now()
         WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
