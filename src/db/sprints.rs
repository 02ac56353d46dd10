use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Sprint;

pub async fn create(
    pool: &PgPool,
    project_id: Uuid,
    name: &str,
    goal: Option<&str>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<Sprint, sqlx::Error> {
    sqlx::query_as::<_, Sprint>(
        "INSERT INTO sprints (project_id, name, goal, start_date, end_date)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(project_id)
    .bind(name)
    .bind(goal)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await
}

pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Sprint>, sqlx::Error> {
    sqlx::query_as::<_, Sprint>(
        "SELECT * FROM sprints WHERE project_id = $1 AND NOT is_deleted
         ORDER BY created_at DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Sprint>, sqlx::Error> {
    sqlx::query_as::<_, Sprint>("SELECT * FROM sprints WHERE id = $1 AND NOT is_deleted")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    goal: Option<&str>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<Sprint, sqlx::Error> {
    sqlx::query_as::<_, Sprint>(
        "UPDATE sprints SET name = $2, goal = $3, start_date = $4, end_date = $5,
            updated_at = now()
         WHERE id = $1 AND NOT is_deleted RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(goal)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await
}

pub async fn set_active(pool: &PgPool, id: Uuid, active: bool) -> Result<Sprint, sqlx::Error> {
    sqlx::query_as::<_, Sprint>(
        "UPDATE sprints SET is_active = $2, updated_at = now()
         WHERE id = $1 AND NOT is_deleted RETURNING *",
    )
    .bind(id)
    .bind(active)
    .fetch_one(pool)
    .await
}

pub async fn complete(pool: &PgPool, id: Uuid) -> Result<Sprint, sqlx::Error> {
    sqlx::query_as::<_, Sprint>(
        "UPDATE sprints SET is_active = FALSE, is_completed = TRUE, updated_at = now()
         WHERE id = $1 AND NOT is_deleted RETURNING *",
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE sprints SET is_deleted = TRUE, updated_at = now()
         WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
