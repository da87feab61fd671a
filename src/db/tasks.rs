//! Task queries.

use crate::models::{CreateTask, Task, TaskFilter, UpdateTask};
use crate::{Error, Result};

use super::DbPool;

/// List a user's tasks with optional filters.
pub async fn list_tasks(pool: &DbPool, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>> {
    // Fixed shape: each filter is either a match or a pass-through
    sqlx::query_as::<_, Task>(
        r#"
        SELECT * FROM tasks
        WHERE user_id = ?
          AND (? IS NULL OR event_id = ?)
          AND (? IS NULL OR contact_id = ?)
          AND (? IS NULL OR completed = ?)
        ORDER BY completed ASC, due_date IS NULL, due_date ASC, created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(&filter.event_id)
    .bind(&filter.event_id)
    .bind(&filter.contact_id)
    .bind(&filter.contact_id)
    .bind(filter.completed)
    .bind(filter.completed)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Get a single task, scoped to its owner.
pub async fn get_task(pool: &DbPool, user_id: &str, id: &str) -> Result<Task> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Task not found: {}", id)))
}

/// Create a new task.
pub async fn create_task(pool: &DbPool, user_id: &str, id: &str, input: CreateTask) -> Result<Task> {
    sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (id, user_id, contact_id, event_id, title, due_date, completed)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&input.contact_id)
    .bind(&input.event_id)
    .bind(&input.title)
    .bind(&input.due_date)
    .bind(input.completed)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Update a task. Absent fields keep their current value.
pub async fn update_task(
    pool: &DbPool,
    user_id: &str,
    id: &str,
    input: UpdateTask,
) -> Result<Task> {
    sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks SET
            contact_id = COALESCE(?, contact_id),
            event_id = COALESCE(?, event_id),
            title = COALESCE(?, title),
            due_date = COALESCE(?, due_date),
            completed = COALESCE(?, completed),
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(&input.contact_id)
    .bind(&input.event_id)
    .bind(&input.title)
    .bind(&input.due_date)
    .bind(input.completed)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Task not found: {}", id)))
}

/// Delete a task.
pub async fn delete_task(pool: &DbPool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Task not found: {}", id)));
    }

    Ok(())
}
