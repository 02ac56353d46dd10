use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Permission, Role, RolePermission, UserRole};

/// True iff some live role assignment for the user reaches a live
/// role-permission link whose live permission row carries the given name.
/// An unknown user or a user with no roles yields false, never an error.
pub async fn has_permission(
    pool: &PgPool,
    user_id: Uuid,
    permission: &str,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
            SELECT 1 FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id AND NOT r.is_deleted
            JOIN role_permissions rp ON rp.role_id = ur.role_id AND NOT rp.is_deleted
            JOIN permissions p ON p.id = rp.permission_id AND NOT p.is_deleted
            WHERE ur.user_id = $1 AND NOT ur.is_deleted AND p.name = $2
        )",
    )
    .bind(user_id)
    .bind(permission)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Distinct permission names across all of the user's live role assignments.
pub async fn list_permissions(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT p.name FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id AND NOT r.is_deleted
         JOIN role_permissions rp ON rp.role_id = ur.role_id AND NOT rp.is_deleted
         JOIN permissions p ON p.id = rp.permission_id AND NOT p.is_deleted
         WHERE ur.user_id = $1 AND NOT ur.is_deleted
         ORDER BY p.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_role_names(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT r.name FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id AND NOT r.is_deleted
         WHERE ur.user_id = $1 AND NOT ur.is_deleted
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

// ── Roles ───────────────────────────────────────────────────────

pub async fn create_role(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
) -> Result<Role, sqlx::Error> {
    sqlx::query_as::<_, Role>(
        "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn list_roles(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE NOT is_deleted ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn find_role_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1 AND NOT is_deleted")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_role(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Role, sqlx::Error> {
    sqlx::query_as::<_, Role>(
        "UPDATE roles SET name = $2, description = $3, updated_at = now()
         WHERE id = $1 AND NOT is_deleted RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn soft_delete_role(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE roles SET is_deleted = TRUE, updated_at = now()
         WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

// ── Permissions ─────────────────────────────────────────────────

pub async fn create_permission(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
) -> Result<Permission, sqlx::Error> {
    sqlx::query_as::<_, Permission>(
        "INSERT INTO permissions (name, description) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn list_all_permissions(pool: &PgPool) -> Result<Vec<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>(
        "SELECT * FROM permissions WHERE NOT is_deleted ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_permission_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1 AND NOT is_deleted")
        .bind(id)
        .fetch_optional(pool)
        .await
}

// ── Role assignments ────────────────────────────────────────────

pub async fn assign_role<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    role_id: Uuid,
) -> Result<UserRole, sqlx::Error> {
    sqlx::query_as::<_, UserRole>(
        "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(role_id)
    .fetch_one(executor)
    .await
}

pub async fn remove_role(pool: &PgPool, user_id: Uuid, role_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE user_roles SET is_deleted = TRUE, updated_at = now()
         WHERE user_id = $1 AND role_id = $2 AND NOT is_deleted",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_roles_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>(
        "SELECT r.* FROM roles r
         JOIN user_roles ur ON ur.role_id = r.id AND NOT ur.is_deleted
         WHERE ur.user_id = $1 AND NOT r.is_deleted
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

// ── Role-permission links ───────────────────────────────────────

pub async fn grant_permission(
    pool: &PgPool,
    role_id: Uuid,
    permission_id: Uuid,
) -> Result<RolePermission, sqlx::Error> {
    sqlx::query_as::<_, RolePermission>(
        "INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(role_id)
    .bind(permission_id)
    .fetch_one(pool)
    .await
}

pub async fn revoke_permission(
    pool: &PgPool,
    role_id: Uuid,
    permission_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE role_permissions SET is_deleted = TRUE, updated_at = now()
         WHERE role_id = $1 AND permission_id = $2 AND NOT is_deleted",
    )
    .bind(role_id)
    .bind(permission_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_permissions_for_role(
    pool: &PgPool,
    role_id: Uuid,
) -> Result<Vec<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>(
        "SELECT p.* FROM permissions p
         JOIN role_permissions rp ON rp.permission_id = p.id AND NOT rp.is_deleted
         WHERE rp.role_id = $1 AND NOT p.is_deleted
         ORDER BY p.name",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await
}
