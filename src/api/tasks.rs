//! Task routes.
//!
//! Routes:
//! - GET    /api/tasks      - List tasks (filters: event_id, contact_id, completed)
//! - POST   /api/tasks      - Create a task
//! - GET    /api/tasks/:id  - Get a task
//! - PUT    /api/tasks/:id  - Update a task
//! - DELETE /api/tasks/:id  - Delete a task

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use crate::middleware::SessionUser;
use crate::models::{CreateTask, Task, TaskFilter, UpdateTask};
use crate::{AppState, Error, Result};

/// Build task routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
}

#[axum::debug_handler]
async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<Task>>> {
    let tasks = state.store.list_tasks(&user.user_id, &filter).await?;
    Ok(Json(tasks))
}

#[axum::debug_handler]
async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<Task>> {
    let task = state.store.get_task(&user.user_id, &id).await?;
    Ok(Json(task))
}

#[axum::debug_handler]
async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>)> {
    input.validate().map_err(Error::Validation)?;
    let task = state.store.create_task(&user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[axum::debug_handler]
async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>> {
    let task = state.store.update_task(&user.user_id, &id, input).await?;
    Ok(Json(task))
}

#[axum::debug_handler]
async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store.delete_task(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
