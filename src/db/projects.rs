use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Project;

pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE NOT is_deleted ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn list_for_member(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT p.* FROM projects p
         JOIN project_members m ON m.project_id = p.id AND NOT m.is_deleted
         WHERE m.user_id = $1 AND NOT p.is_deleted
         ORDER BY p.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Creates the project and its owner membership row in one transaction.
pub async fn create(
    pool: &PgPool,
    name: &str,
    key: &str,
    description: Option<&str>,
    owner_id: Uuid,
) -> Result<Project, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let project = sqlx::query_as::<_, Project>(
        "INSERT INTO projects (name, key, description, owner_id)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(name)
    .bind(key)
    .bind(description)
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)")
        .bind(project.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(project)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND NOT is_deleted")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET name = $2, description = $3, updated_at = now()
         WHERE id = $1 AND NOT is_deleted RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE projects SET is_deleted = TRUE, updated_at = now()
         WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
