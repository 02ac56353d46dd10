use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;

// Permission catalog. Names match the rows seeded by migration.
pub const PROJECTS_CREATE: &str = "Projects.Create";
pub const PROJECTS_EDIT: &str = "Projects.Edit";
pub const PROJECTS_DELETE: &str = "Projects.Delete";
pub const WORK_ITEMS_CREATE: &str = "WorkItems.Create";
pub const WORK_ITEMS_EDIT: &str = "WorkItems.Edit";
pub const WORK_ITEMS_DELETE: &str = "WorkItems.Delete";
pub const SPRINTS_MANAGE: &str = "Sprints.Manage";
pub const DOCUMENTS_MANAGE: &str = "Documents.Manage";
pub const USERS_VIEW: &str = "Users.View";
pub const GROUPS_MANAGE: &str = "Groups.Manage";
pub const ADMIN_ACCESS: &str = "Admin.AccessAdminPanel";
pub const ADMIN_MANAGE_ROLES: &str = "Admin.ManageRoles";
pub const ADMIN_MANAGE_USERS: &str = "Admin.ManageUsers";
pub const ADMIN_VIEW_AUDIT_LOG: &str = "Admin.ViewAuditLog";

/// Single boolean gate: the caller either holds the permission or the
/// request stops with 403.
pub async fn require_permission(
    pool: &PgPool,
    auth: &AuthUser,
    permission: &str,
) -> Result<(), AppError> {
    if db::rbac::has_permission(pool, auth.user_id, permission).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Missing required permission: {permission}"
        )))
    }
}

/// Owner-or-permission check used by project-scoped mutations: the project
/// owner may always act, anyone else needs the named permission.
pub async fn require_owner_or_permission(
    pool: &PgPool,
    auth: &AuthUser,
    owner_id: Uuid,
    permission: &str,
) -> Result<(), AppError> {
    if auth.user_id == owner_id {
        return Ok(());
    }
    require_permission(pool, auth, permission).await
}
