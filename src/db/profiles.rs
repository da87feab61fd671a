//! Profile queries.

use crate::models::{Profile, UpdateProfile};
use crate::{Error, Result};

use super::DbPool;

/// Get a user's profile, creating an empty row on first access.
pub async fn get_or_create_profile(pool: &DbPool, user_id: &str) -> Result<Profile> {
    if let Some(profile) =
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
    {
        return Ok(profile);
    }

    sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (id, user_id)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET user_id = user_id
        RETURNING *
        "#,
    )
    .bind(crate::models::new_id())
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Update profile display fields. Absent fields keep their current value.
pub async fn update_profile(pool: &DbPool, user_id: &str, input: UpdateProfile) -> Result<Profile> {
    // Ensure the row exists before updating
    get_or_create_profile(pool, user_id).await?;

    sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles SET
            display_name = COALESCE(?, display_name),
            headline = COALESCE(?, headline),
            avatar_url = COALESCE(?, avatar_url),
            updated_at = datetime('now')
        WHERE user_id = ?
        RETURNING *
        "#,
    )
    .bind(&input.display_name)
    .bind(&input.headline)
    .bind(&input.avatar_url)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};

    #[tokio::test]
    async fn test_first_read_creates_empty_profile() {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let profile = get_or_create_profile(&pool, "user-1").await.unwrap();
        assert_eq!(profile.user_id, "user-1");
        assert!(profile.display_name.is_none());

        // Second read returns the same row
        let again = get_or_create_profile(&pool, "user-1").await.unwrap();
        assert_eq!(again.id, profile.id);
    }

    #[tokio::test]
    async fn test_update_profile_fields() {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let updated = update_profile(
            &pool,
            "user-1",
            UpdateProfile {
                display_name: Some("Jordan Li".to_string()),
                headline: Some("Founder".to_string()),
                avatar_url: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.display_name.as_deref(), Some("Jordan Li"));
        assert_eq!(updated.headline.as_deref(), Some("Founder"));
    }
}
