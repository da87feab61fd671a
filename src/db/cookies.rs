//! Session cookie registry queries.
//!
//! Records the exact cookie names issued to a user's browser at session
//! creation, so logout can clear what was actually set instead of guessing
//! name patterns.

use crate::{Error, Result};

use super::DbPool;

/// Record the cookie names issued alongside a new session.
/// Replaces any previous recording for the user.
pub async fn record_session_cookies(
    pool: &DbPool,
    user_id: &str,
    names: &[String],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM session_cookies WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for name in names {
        sqlx::query(
            r#"
            INSERT INTO session_cookies (user_id, cookie_name)
            VALUES (?, ?)
            ON CONFLICT(user_id, cookie_name) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(name)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await.map_err(Error::Database)
}

/// The recorded cookie names for a user, if any.
pub async fn recorded_session_cookies(pool: &DbPool, user_id: &str) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT cookie_name FROM session_cookies WHERE user_id = ? ORDER BY cookie_name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Drop a user's recording after their cookies are cleared.
pub async fn clear_recorded_cookies(pool: &DbPool, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM session_cookies WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
