//! Event queries.

use crate::models::{CreateEvent, Event, UpdateEvent};
use crate::{Error, Result};

use super::DbPool;

/// List all events belonging to a user, newest date first.
pub async fn list_events(pool: &DbPool, user_id: &str) -> Result<Vec<Event>> {
    sqlx::query_as::<_, Event>(
        r#"
        SELECT * FROM events
        WHERE user_id = ?
        ORDER BY date DESC, created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Get a single event, scoped to its owner.
pub async fn get_event(pool: &DbPool, user_id: &str, id: &str) -> Result<Event> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Event not found: {}", id)))
}

/// Create a new event.
pub async fn create_event(
    pool: &DbPool,
    user_id: &str,
    id: &str,
    input: CreateEvent,
) -> Result<Event> {
    sqlx::query_as::<_, Event>(
        r#"
        INSERT INTO events (id, user_id, title, date, location, company, color_index)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.date)
    .bind(&input.location)
    .bind(&input.company)
    .bind(input.color_index)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Update an event. Absent fields keep their current value.
pub async fn update_event(
    pool: &DbPool,
    user_id: &str,
    id: &str,
    input: UpdateEvent,
) -> Result<Event> {
    sqlx::query_as::<_, Event>(
        r#"
        UPDATE events SET
            title = COALESCE(?, title),
            date = COALESCE(?, date),
            location = COALESCE(?, location),
            company = COALESCE(?, company),
            color_index = COALESCE(?, color_index),
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(&input.title)
    .bind(&input.date)
    .bind(&input.location)
    .bind(&input.company)
    .bind(input.color_index)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Event not found: {}", id)))
}

/// Delete an event.
pub async fn delete_event(pool: &DbPool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM events WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Event not found: {}", id)));
    }

    Ok(())
}
