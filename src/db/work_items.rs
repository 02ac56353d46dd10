use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{WorkItem, WorkItemPriority, WorkItemStatus, WorkItemType};

pub struct NewWorkItem<'a> {
    pub project_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub item_type: WorkItemType,
    pub status: WorkItemStatus,
    pub priority: WorkItemPriority,
    pub story_points: Option<i32>,
    pub time_spent_minutes: Option<i32>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub sprint_id: Option<Uuid>,
}

pub async fn create(pool: &PgPool, item: NewWorkItem<'_>) -> Result<WorkItem, sqlx::Error> {
    sqlx::query_as::<_, WorkItem>(
        "INSERT INTO work_items
            (project_id, title, description, item_type, status, priority,
             story_points, time_spent_minutes, assignee_id, reporter_id, parent_id, sprint_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING *",
    )
    .bind(item.project_id)
    .bind(item.title)
    .bind(item.description)
    .bind(item.item_type)
    .bind(item.status)
    .bind(item.priority)
    .bind(item.story_points)
    .bind(item.time_spent_minutes)
    .bind(item.assignee_id)
    .bind(item.reporter_id)
    .bind(item.parent_id)
    .bind(item.sprint_id)
    .fetch_one(pool)
    .await
}

pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<WorkItem>, sqlx::Error> {
    sqlx::query_as::<_, WorkItem>(
        "SELECT * FROM work_items WHERE project_id = $1 AND NOT is_deleted
         ORDER BY created_at DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_sprint(pool: &PgPool, sprint_id: Uuid) -> Result<Vec<WorkItem>, sqlx::Error> {
    sqlx::query_as::<_, WorkItem>(
        "SELECT * FROM work_items WHERE sprint_id = $1 AND NOT is_deleted
         ORDER BY created_at DESC",
    )
    .bind(sprint_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<WorkItem>, sqlx::Error> {
    sqlx::query_as::<_, WorkItem>("SELECT * FROM work_items WHERE id = $1 AND NOT is_deleted")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub struct WorkItemChanges<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub item_type: WorkItemType,
    pub status: WorkItemStatus,
    pub priority: WorkItemPriority,
    pub story_points: Option<i32>,
    pub time_spent_minutes: Option<i32>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub sprint_id: Option<Uuid>,
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: WorkItemChanges<'_>,
) -> Result<WorkItem, sqlx::Error> {
    sqlx::query_as::<_, WorkItem>(
        "UPDATE work_items SET
            title = $2, description = $3, item_type = $4, status = $5, priority = $6,
            story_points = $7, time_spent_minutes = $8, assignee_id = $9,
            reporter_id = $10, parent_id = $11, sprint_id = $12, updated_at = now()
         WHERE id = $1 AND NOT is_deleted RETURNING *",
    )
    .bind(id)
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.item_type)
    .bind(changes.status)
    .bind(changes.priority)
    .bind(changes.story_points)
    .bind(changes.time_spent_minutes)
    .bind(changes.assignee_id)
    .bind(changes.reporter_id)
    .bind(changes.parent_id)
    .bind(changes.sprint_id)
    .fetch_one(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE work_items SET is_deleted = TRUE, updated_at = now()
         WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
