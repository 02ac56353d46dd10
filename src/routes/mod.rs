pub mod auth;
pub mod users;
pub mod projects;
pub mod work_items;
pub mod sprints;
pub mod comments;
pub mod documents;
pub mod groups;
pub mod admin;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Users
        .route("/api/v1/users", get(users::list))
        .route("/api/v1/users/me", get(users::me).put(users::update_me))
        .route("/api/v1/users/me/permissions", get(users::my_permissions))
        .route("/api/v1/users/{id}", get(users::get).delete(users::delete))
        // Projects
        .route("/api/v1/projects", get(projects::list).post(projects::create))
        .route(
            "/api/v1/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route(
            "/api/v1/projects/{id}/members",
            get(projects::list_members).post(projects::add_member),
        )
        .route(
            "/api/v1/projects/{id}/members/{user_id}",
            delete(projects::remove_member),
        )
        // Work items
        .route(
            "/api/v1/projects/{id}/workitems",
            get(work_items::list_by_project).post(work_items::create),
        )
        .route(
            "/api/v1/workitems/{id}",
            get(work_items::get)
                .put(work_items::update)
                .delete(work_items::delete),
        )
        // Sprints
        .route(
            "/api/v1/projects/{id}/sprints",
            get(sprints::list_by_project).post(sprints::create),
        )
        .route(
            "/api/v1/sprints/{id}",
            get(sprints::get).put(sprints::update).delete(sprints::delete),
        )
        .route("/api/v1/sprints/{id}/start", post(sprints::start))
        .route("/api/v1/sprints/{id}/complete", post(sprints::complete))
        .route("/api/v1/sprints/{id}/workitems", get(sprints::list_work_items))
        // Comments
        .route(
            "/api/v1/workitems/{id}/comments",
            get(comments::list_by_work_item).post(comments::create),
        )
        .route(
            "/api/v1/comments/{id}",
            put(comments::update).delete(comments::delete),
        )
        // Documents
        .route(
            "/api/v1/projects/{id}/documents",
            get(documents::list_by_project).post(documents::create),
        )
        .route(
            "/api/v1/documents/{id}",
            get(documents::get)
                .put(documents::update)
                .delete(documents::delete),
        )
        // Groups
        .route("/api/v1/groups", get(groups::list).post(groups::create))
        .route(
            "/api/v1/groups/{id}",
            get(groups::get).put(groups::update).delete(groups::delete),
        )
        .route(
            "/api/v1/groups/{id}/members",
            get(groups::list_members).post(groups::add_member),
        )
        .route(
            "/api/v1/groups/{id}/members/{user_id}",
            delete(groups::remove_member),
        )
        // Admin
        .route(
            "/api/v1/admin/roles",
            get(admin::list_roles).post(admin::create_role),
        )
        .route(
            "/api/v1/admin/roles/{id}",
            put(admin::update_role).delete(admin::delete_role),
        )
        .route(
            "/api/v1/admin/roles/{id}/permissions",
            get(admin::list_role_permissions).post(admin::grant_permission),
        )
        .route(
            "/api/v1/admin/roles/{id}/permissions/{permission_id}",
            delete(admin::revoke_permission),
        )
        .route(
            "/api/v1/admin/permissions",
            get(admin::list_permissions).post(admin::create_permission),
        )
        .route(
            "/api/v1/admin/users/{id}/roles",
            get(admin::list_user_roles).post(admin::assign_role),
        )
        .route(
            "/api/v1/admin/users/{id}/roles/{role_id}",
            delete(admin::remove_role),
        )
        .route("/api/v1/admin/audit", get(admin::list_audit_events))
}
