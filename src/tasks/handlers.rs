use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::TaskListQuery;
use super::repo_types::{NewTask, Task, TaskPatch};
use crate::{auth::jwt::AuthUser, error::http_error, state::AppState};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", patch(update_task).delete(delete_task))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    if payload.name.trim().is_empty() {
        warn!(actor, "task without a name");
        return Err((StatusCode::BAD_REQUEST, "Task name is required".into()));
    }
    let task = state.repo.insert_task(payload).await.map_err(http_error)?;
    info!(actor, task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Query(q): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    let (filter, page) = q.split();
    Ok(Json(state.repo.get_tasks(&filter, page).await))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<TaskPatch>,
) -> Result<Json<Task>, (StatusCode, String)> {
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err((StatusCode::BAD_REQUEST, "Task name cannot be empty".into()));
    }
    let task = state.repo.update_task(id, payload).await.map_err(http_error)?;
    info!(actor, task_id = id, "task updated");
    Ok(Json(task))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.repo.delete_task(id).await.map_err(http_error)?;
    info!(actor, task_id = id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}
