use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Group, GroupMember, User};

pub async fn create(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
    project_id: Option<Uuid>,
) -> Result<Group, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        "INSERT INTO groups (name, description, project_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(project_id)
    .fetch_one(pool)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        "SELECT * FROM groups WHERE NOT is_deleted ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1 AND NOT is_deleted")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Group, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        "UPDATE groups SET name = $2, description = $3, updated_at = now()
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
        "UPDATE groups SET is_deleted = TRUE, updated_at = now()
         WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn add_member(
    pool: &PgPool,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<GroupMember, sqlx::Error> {
    sqlx::query_as::<_, GroupMember>(
        "INSERT INTO group_members (group_id, user_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(group_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn list_members(pool: &PgPool, group_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u
         JOIN group_members m ON m.user_id = u.id AND NOT m.is_deleted
         WHERE m.group_id = $1 AND NOT u.is_deleted
         ORDER BY m.created_at",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await
}

pub async fn remove_member(
    pool: &PgPool,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE group_members SET is_deleted = TRUE, updated_at = now()
         WHERE group_id = $1 AND user_id = $2 AND NOT is_deleted",
    )
    .bind(group_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
