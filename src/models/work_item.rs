use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "work_item_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkItemType {
    Epic,
    Story,
    Task,
    Bug,
    Subtask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "work_item_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Todo,
    InProgress,
    InReview,
    Done,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "work_item_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkItemPriority {
    Low,
    Medium,
    High,
    Critical,
    Blocker,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub item_type: WorkItemType,
    pub status: WorkItemStatus,
    pub priority: WorkItemPriority,
    pub story_points: Option<i32>,
    pub time_spent_minutes: Option<i32>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub sprint_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
