//! Contact queries.

use crate::models::{Contact, CreateContact, UpdateContact};
use crate::{Error, Result};

use super::DbPool;

/// List a user's contacts, optionally filtered to one event.
pub async fn list_contacts(
    pool: &DbPool,
    user_id: &str,
    event_id: Option<&str>,
) -> Result<Vec<Contact>> {
    match event_id {
        Some(event_id) => sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE user_id = ? AND event_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
        None => sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
    }
}

/// Get a single contact, scoped to its owner.
pub async fn get_contact(pool: &DbPool, user_id: &str, id: &str) -> Result<Contact> {
    sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Contact not found: {}", id)))
}

/// Create a new contact.
pub async fn create_contact(
    pool: &DbPool,
    user_id: &str,
    id: &str,
    input: CreateContact,
) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts (id, user_id, event_id, name, email, phone, company, role, notes, voice_memo_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&input.event_id)
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.company)
    .bind(&input.role)
    .bind(&input.notes)
    .bind(&input.voice_memo_url)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Update a contact. Absent fields keep their current value.
pub async fn update_contact(
    pool: &DbPool,
    user_id: &str,
    id: &str,
    input: UpdateContact,
) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(
        r#"
        UPDATE contacts SET
            event_id = COALESCE(?, event_id),
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            company = COALESCE(?, company),
            role = COALESCE(?, role),
            notes = COALESCE(?, notes),
            voice_memo_url = COALESCE(?, voice_memo_url),
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(&input.event_id)
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.company)
    .bind(&input.role)
    .bind(&input.notes)
    .bind(&input.voice_memo_url)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Contact not found: {}", id)))
}

/// Delete a contact.
pub async fn delete_contact(pool: &DbPool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Contact not found: {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};

    async fn test_pool() -> DbPool {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_contact_event_filter() {
        let pool = test_pool().await;

        let event_id = crate::models::new_id();
        crate::db::create_event(
            &pool,
            "user-1",
            &event_id,
            crate::models::CreateEvent {
                title: "Meetup".to_string(),
                date: "2026-05-01".to_string(),
                location: None,
                company: None,
                color_index: 0,
            },
        )
        .await
        .unwrap();

        for (name, linked) in [("Ada", true), ("Grace", false)] {
            create_contact(
                &pool,
                "user-1",
                &crate::models::new_id(),
                CreateContact {
                    event_id: linked.then(|| event_id.clone()),
                    name: name.to_string(),
                    email: None,
                    phone: None,
                    company: None,
                    role: None,
                    notes: None,
                    voice_memo_url: None,
                },
            )
            .await
            .unwrap();
        }

        let all = list_contacts(&pool, "user-1", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let at_event = list_contacts(&pool, "user-1", Some(&event_id)).await.unwrap();
        assert_eq!(at_event.len(), 1);
        assert_eq!(at_event[0].name, "Ada");
    }
}
