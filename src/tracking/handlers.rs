use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use super::dto::{SummaryItem, SummaryRequest, TrackRequest};
use super::repo_types::TimeEntry;
use crate::{auth::jwt::AuthUser, error::http_error, state::AppState};

pub fn tracking_routes() -> Router<AppState> {
    Router::new()
        .route("/tracking/start", post(start_tracking))
        .route("/tracking/stop", post(stop_tracking))
        .route("/tracking/summary", post(summary))
}

#[instrument(skip(state))]
pub async fn start_tracking(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<TrackRequest>,
) -> Result<(StatusCode, Json<TimeEntry>), (StatusCode, String)> {
    let entry = state
        .repo
        .start_task_tracking(user_id, req.task_id)
        .await
        .map_err(http_error)?;
    info!(user_id, task_id = req.task_id, entry_id = entry.id, "tracking started");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn stop_tracking(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<TrackRequest>,
) -> Result<Json<TimeEntry>, (StatusCode, String)> {
    let entry = state
        .repo
        .stop_task_tracking(user_id, req.task_id)
        .await
        .map_err(http_error)?;
    info!(user_id, task_id = req.task_id, entry_id = entry.id, "tracking stopped");
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<Vec<SummaryItem>>, (StatusCode, String)> {
    let user_id = req.user_id.unwrap_or(caller);
    if user_id != caller {
        warn!(caller, user_id, "summary requested for another user");
        return Err((
            StatusCode::FORBIDDEN,
            "Summaries are only available for your own account".into(),
        ));
    }
    let totals = state
        .repo
        .summary_for_user(user_id, req.start_date, req.end_date)
        .await
        .map_err(http_error)?;
    Ok(Json(totals.into_iter().map(SummaryItem::from).collect()))
}
