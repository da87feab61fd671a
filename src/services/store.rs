//! Record store: one CRUD surface, two backings.
//!
//! Handlers only ever see `Arc<dyn RecordStore>`; whether records live in
//! SQLite or an in-process map is a deployment choice, never a branch in
//! business logic. The memory backing keeps the original mock's optional
//! artificial latency so a dev setup still feels like a network.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::config::{StoreBackend, StoreConfig};
use crate::db::{self, DbPool};
use crate::models::{
    Contact, CreateContact, CreateEvent, CreateTask, Event, Task, TaskFilter, UpdateContact,
    UpdateEvent, UpdateTask,
};
use crate::{Error, Result};

/// User-scoped CRUD over the three record kinds.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_events(&self, user_id: &str) -> Result<Vec<Event>>;
    async fn get_event(&self, user_id: &str, id: &str) -> Result<Event>;
    async fn create_event(&self, user_id: &str, input: CreateEvent) -> Result<Event>;
    async fn update_event(&self, user_id: &str, id: &str, input: UpdateEvent) -> Result<Event>;
    async fn delete_event(&self, user_id: &str, id: &str) -> Result<()>;

    async fn list_contacts(&self, user_id: &str, event_id: Option<&str>) -> Result<Vec<Contact>>;
    async fn get_contact(&self, user_id: &str, id: &str) -> Result<Contact>;
    async fn create_contact(&self, user_id: &str, input: CreateContact) -> Result<Contact>;
    async fn update_contact(&self, user_id: &str, id: &str, input: UpdateContact)
        -> Result<Contact>;
    async fn delete_contact(&self, user_id: &str, id: &str) -> Result<()>;

    async fn list_tasks(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>>;
    async fn get_task(&self, user_id: &str, id: &str) -> Result<Task>;
    async fn create_task(&self, user_id: &str, input: CreateTask) -> Result<Task>;
    async fn update_task(&self, user_id: &str, id: &str, input: UpdateTask) -> Result<Task>;
    async fn delete_task(&self, user_id: &str, id: &str) -> Result<()>;
}

/// Build the configured store backend.
pub fn build_store(config: &StoreConfig, pool: DbPool) -> Arc<dyn RecordStore> {
    match config.backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::new(pool)),
        StoreBackend::Memory => Arc::new(MemoryStore::new(Duration::from_millis(
            config.simulated_latency_ms,
        ))),
    }
}

// ============================================================================
// SQLite backing
// ============================================================================

/// Store backed by the SQLite query modules.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn list_events(&self, user_id: &str) -> Result<Vec<Event>> {
        db::list_events(&self.pool, user_id).await
    }

    async fn get_event(&self, user_id: &str, id: &str) -> Result<Event> {
        db::get_event(&self.pool, user_id, id).await
    }

    async fn create_event(&self, user_id: &str, input: CreateEvent) -> Result<Event> {
        db::create_event(&self.pool, user_id, &crate::models::new_id(), input).await
    }

    async fn update_event(&self, user_id: &str, id: &str, input: UpdateEvent) -> Result<Event> {
        db::update_event(&self.pool, user_id, id, input).await
    }

    async fn delete_event(&self, user_id: &str, id: &str) -> Result<()> {
        db::delete_event(&self.pool, user_id, id).await
    }

    async fn list_contacts(&self, user_id: &str, event_id: Option<&str>) -> Result<Vec<Contact>> {
        db::list_contacts(&self.pool, user_id, event_id).await
    }

    async fn get_contact(&self, user_id: &str, id: &str) -> Result<Contact> {
        db::get_contact(&self.pool, user_id, id).await
    }

    async fn create_contact(&self, user_id: &str, input: CreateContact) -> Result<Contact> {
        db::create_contact(&self.pool, user_id, &crate::models::new_id(), input).await
    }

    async fn update_contact(
        &self,
        user_id: &str,
        id: &str,
        input: UpdateContact,
    ) -> Result<Contact> {
        db::update_contact(&self.pool, user_id, id, input).await
    }

    async fn delete_contact(&self, user_id: &str, id: &str) -> Result<()> {
        db::delete_contact(&self.pool, user_id, id).await
    }

    async fn list_tasks(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>> {
        db::list_tasks(&self.pool, user_id, filter).await
    }

    async fn get_task(&self, user_id: &str, id: &str) -> Result<Task> {
        db::get_task(&self.pool, user_id, id).await
    }

    async fn create_task(&self, user_id: &str, input: CreateTask) -> Result<Task> {
        db::create_task(&self.pool, user_id, &crate::models::new_id(), input).await
    }

    async fn update_task(&self, user_id: &str, id: &str, input: UpdateTask) -> Result<Task> {
        db::update_task(&self.pool, user_id, id, input).await
    }

    async fn delete_task(&self, user_id: &str, id: &str) -> Result<()> {
        db::delete_task(&self.pool, user_id, id).await
    }
}

// ============================================================================
// In-memory backing
// ============================================================================

/// Store backed by in-process maps. Last writer wins; concurrent handles
/// are not coordinated beyond the lock.
pub struct MemoryStore {
    events: RwLock<HashMap<String, Event>>,
    contacts: RwLock<HashMap<String, Contact>>,
    tasks: RwLock<HashMap<String, Task>>,
    latency: Duration,
}

impl MemoryStore {
    pub fn new(latency: Duration) -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            contacts: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            latency,
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn now() -> String {
        Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn not_found(kind: &str, id: &str) -> Error {
    Error::NotFound(format!("{} not found: {}", kind, id))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_events(&self, user_id: &str) -> Result<Vec<Event>> {
        self.simulate_latency().await;
        let mut events: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(events)
    }

    async fn get_event(&self, user_id: &str, id: &str) -> Result<Event> {
        self.simulate_latency().await;
        self.events
            .read()
            .await
            .get(id)
            .filter(|e| e.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found("Event", id))
    }

    async fn create_event(&self, user_id: &str, input: CreateEvent) -> Result<Event> {
        self.simulate_latency().await;
        let now = Self::now();
        let event = Event {
            id: crate::models::new_id(),
            user_id: user_id.to_string(),
            title: input.title,
            date: input.date,
            location: input.location,
            company: input.company,
            color_index: input.color_index,
            created_at: now.clone(),
            updated_at: now,
        };
        self.events
            .write()
            .await
            .insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn update_event(&self, user_id: &str, id: &str, input: UpdateEvent) -> Result<Event> {
        self.simulate_latency().await;
        let mut events = self.events.write().await;
        let event = events
            .get_mut(id)
            .filter(|e| e.user_id == user_id)
            .ok_or_else(|| not_found("Event", id))?;

        if let Some(title) = input.title {
            event.title = title;
        }
        if let Some(date) = input.date {
            event.date = date;
        }
        if input.location.is_some() {
            event.location = input.location;
        }
        if input.company.is_some() {
            event.company = input.company;
        }
        if let Some(color_index) = input.color_index {
            event.color_index = color_index;
        }
        event.updated_at = Self::now();
        Ok(event.clone())
    }

    async fn delete_event(&self, user_id: &str, id: &str) -> Result<()> {
        self.simulate_latency().await;
        let mut events = self.events.write().await;
        match events.get(id) {
            Some(e) if e.user_id == user_id => {
                events.remove(id);
                Ok(())
            }
            _ => Err(not_found("Event", id)),
        }
    }

    async fn list_contacts(&self, user_id: &str, event_id: Option<&str>) -> Result<Vec<Contact>> {
        self.simulate_latency().await;
        let mut contacts: Vec<Contact> = self
            .contacts
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .filter(|c| event_id.is_none() || c.event_id.as_deref() == event_id)
            .cloned()
            .collect();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contacts)
    }

    async fn get_contact(&self, user_id: &str, id: &str) -> Result<Contact> {
        self.simulate_latency().await;
        self.contacts
            .read()
            .await
            .get(id)
            .filter(|c| c.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found("Contact", id))
    }

    async fn create_contact(&self, user_id: &str, input: CreateContact) -> Result<Contact> {
        self.simulate_latency().await;
        let now = Self::now();
        let contact = Contact {
            id: crate::models::new_id(),
            user_id: user_id.to_string(),
            event_id: input.event_id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            company: input.company,
            role: input.role,
            notes: input.notes,
            voice_memo_url: input.voice_memo_url,
            created_at: now.clone(),
            updated_at: now,
        };
        self.contacts
            .write()
            .await
            .insert(contact.id.clone(), contact.clone());
        Ok(contact)
    }

    async fn update_contact(
        &self,
        user_id: &str,
        id: &str,
        input: UpdateContact,
    ) -> Result<Contact> {
        self.simulate_latency().await;
        let mut contacts = self.contacts.write().await;
        let contact = contacts
            .get_mut(id)
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| not_found("Contact", id))?;

        if input.event_id.is_some() {
            contact.event_id = input.event_id;
        }
        if let Some(name) = input.name {
            contact.name = name;
        }
        if input.email.is_some() {
            contact.email = input.email;
        }
        if input.phone.is_some() {
            contact.phone = input.phone;
        }
        if input.company.is_some() {
            contact.company = input.company;
        }
        if input.role.is_some() {
            contact.role = input.role;
        }
        if input.notes.is_some() {
            contact.notes = input.notes;
        }
        if input.voice_memo_url.is_some() {
            contact.voice_memo_url = input.voice_memo_url;
        }
        contact.updated_at = Self::now();
        Ok(contact.clone())
    }

    async fn delete_contact(&self, user_id: &str, id: &str) -> Result<()> {
        self.simulate_latency().await;
        let mut contacts = self.contacts.write().await;
        match contacts.get(id) {
            Some(c) if c.user_id == user_id => {
                contacts.remove(id);
                Ok(())
            }
            _ => Err(not_found("Contact", id)),
        }
    }

    async fn list_tasks(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.simulate_latency().await;
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id)
            .filter(|t| {
                filter.event_id.is_none() || t.event_id == filter.event_id
            })
            .filter(|t| {
                filter.contact_id.is_none() || t.contact_id == filter.contact_id
            })
            .filter(|t| filter.completed.map_or(true, |c| t.completed == c))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            a.completed
                .cmp(&b.completed)
                .then(a.due_date.is_none().cmp(&b.due_date.is_none()))
                .then(a.due_date.cmp(&b.due_date))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(tasks)
    }

    async fn get_task(&self, user_id: &str, id: &str) -> Result<Task> {
        self.simulate_latency().await;
        self.tasks
            .read()
            .await
            .get(id)
            .filter(|t| t.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found("Task", id))
    }

    async fn create_task(&self, user_id: &str, input: CreateTask) -> Result<Task> {
        self.simulate_latency().await;
        let now = Self::now();
        let task = Task {
            id: crate::models::new_id(),
            user_id: user_id.to_string(),
            contact_id: input.contact_id,
            event_id: input.event_id,
            title: input.title,
            due_date: input.due_date,
            completed: input.completed,
            created_at: now.clone(),
            updated_at: now,
        };
        self.tasks.write().await.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn update_task(&self, user_id: &str, id: &str, input: UpdateTask) -> Result<Task> {
        self.simulate_latency().await;
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| not_found("Task", id))?;

        if input.contact_id.is_some() {
            task.contact_id = input.contact_id;
        }
        if input.event_id.is_some() {
            task.event_id = input.event_id;
        }
        if let Some(title) = input.title {
            task.title = title;
        }
        if input.due_date.is_some() {
            task.due_date = input.due_date;
        }
        if let Some(completed) = input.completed {
            task.completed = completed;
        }
        task.updated_at = Self::now();
        Ok(task.clone())
    }

    async fn delete_task(&self, user_id: &str, id: &str) -> Result<()> {
        self.simulate_latency().await;
        let mut tasks = self.tasks.write().await;
        match tasks.get(id) {
            Some(t) if t.user_id == user_id => {
                tasks.remove(id);
                Ok(())
            }
            _ => Err(not_found("Task", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};
    use rstest::rstest;

    async fn backend(name: &str) -> Arc<dyn RecordStore> {
        match name {
            "memory" => Arc::new(MemoryStore::new(Duration::ZERO)),
            _ => {
                let pool = init_pool(":memory:").await.unwrap();
                initialize_schema(&pool).await.unwrap();
                Arc::new(SqliteStore::new(pool))
            }
        }
    }

    fn sample_event() -> CreateEvent {
        CreateEvent {
            title: "Founders Dinner".to_string(),
            date: "2026-04-02".to_string(),
            location: Some("SF".to_string()),
            company: Some("Acme".to_string()),
            color_index: 1,
        }
    }

    #[rstest]
    #[case::sqlite("sqlite")]
    #[case::memory("memory")]
    #[tokio::test]
    async fn test_create_then_get_equal_modulo_timestamps(#[case] name: &str) {
        let store = backend(name).await;

        let created = store.create_event("user-1", sample_event()).await.unwrap();
        let fetched = store.get_event("user-1", &created.id).await.unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.date, created.date);
        assert_eq!(fetched.location, created.location);
        assert_eq!(fetched.company, created.company);
        assert_eq!(fetched.color_index, created.color_index);
    }

    #[rstest]
    #[case::sqlite("sqlite")]
    #[case::memory("memory")]
    #[tokio::test]
    async fn test_delete_then_get_is_not_found(#[case] name: &str) {
        let store = backend(name).await;

        let created = store.create_event("user-1", sample_event()).await.unwrap();
        store.delete_event("user-1", &created.id).await.unwrap();

        assert!(matches!(
            store.get_event("user-1", &created.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[rstest]
    #[case::sqlite("sqlite")]
    #[case::memory("memory")]
    #[tokio::test]
    async fn test_records_are_user_scoped(#[case] name: &str) {
        let store = backend(name).await;

        let created = store.create_event("user-1", sample_event()).await.unwrap();
        assert!(store.get_event("user-2", &created.id).await.is_err());
        assert!(store.list_events("user-2").await.unwrap().is_empty());
    }

    #[rstest]
    #[case::sqlite("sqlite")]
    #[case::memory("memory")]
    #[tokio::test]
    async fn test_task_filters_match_across_backends(#[case] name: &str) {
        let store = backend(name).await;

        let event = store.create_event("user-1", sample_event()).await.unwrap();
        store
            .create_task(
                "user-1",
                CreateTask {
                    contact_id: None,
                    event_id: Some(event.id.clone()),
                    title: "intro email".to_string(),
                    due_date: None,
                    completed: false,
                },
            )
            .await
            .unwrap();
        store
            .create_task(
                "user-1",
                CreateTask {
                    contact_id: None,
                    event_id: None,
                    title: "book flights".to_string(),
                    due_date: None,
                    completed: true,
                },
            )
            .await
            .unwrap();

        let by_event = store
            .list_tasks(
                "user-1",
                &TaskFilter {
                    event_id: Some(event.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_event.len(), 1);
        assert_eq!(by_event[0].title, "intro email");

        let open = store
            .list_tasks(
                "user-1",
                &TaskFilter {
                    completed: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
    }
}
