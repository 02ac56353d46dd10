pub mod users;
pub mod projects;
pub mod project_members;
pub mod work_items;
pub mod sprints;
pub mod comments;
pub mod documents;
pub mod groups;
pub mod rbac;
pub mod refresh_tokens;
pub mod audit;
