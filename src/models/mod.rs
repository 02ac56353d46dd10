pub mod user;
pub mod project;
pub mod work_item;
pub mod sprint;
pub mod comment;
pub mod document;
pub mod group;
pub mod rbac;
pub mod refresh_token;
pub mod audit_event;

pub use user::User;
pub use project::{Project, ProjectMember};
pub use work_item::{WorkItem, WorkItemPriority, WorkItemStatus, WorkItemType};
pub use sprint::Sprint;
pub use comment::Comment;
pub use document::Document;
pub use group::{Group, GroupMember};
pub use rbac::{Permission, Role, RolePermission, UserRole};
pub use refresh_token::RefreshToken;
pub use audit_event::AuditEvent;
