use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ProjectMember, User};

pub async fn add(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<ProjectMember, sqlx::Error> {
    sqlx::query_as::<_, ProjectMember>(
        "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn list_users(pool: &PgPool, project_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u
         JOIN project_members m ON m.user_id = u.id AND NOT m.is_deleted
         WHERE m.project_id = $1 AND NOT u.is_deleted
         ORDER BY m.created_at",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn remove(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE project_members SET is_deleted = TRUE, updated_at = now()
         WHERE project_id = $1 AND user_id = $2 AND NOT is_deleted",
    )
    .bind(project_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
