use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CreateUserRequest, UserListQuery};
use super::repo_types::{NewUser, PassportKey, User, UserPatch};
use crate::{auth::jwt::AuthUser, error::http_error, state::AppState, tz::UserZone};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), (StatusCode, String)> {
    let key: PassportKey = payload.passport.parse().map_err(http_error)?;
    let timezone = payload
        .timezone
        .unwrap_or_else(|| state.config.defaults.timezone.clone());
    UserZone::parse(&timezone).map_err(http_error)?;

    let new = NewUser {
        surname: payload.surname,
        name: payload.name,
        patronymic: payload.patronymic,
        address: payload.address,
        default_end_time: payload
            .default_end_time
            .or(state.config.defaults.default_end_time),
        ..NewUser::new(key, timezone)
    };
    let user = state.repo.insert_user(new).await.map_err(http_error)?;
    info!(actor, user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Query(q): Query<UserListQuery>,
) -> Result<Json<Vec<User>>, (StatusCode, String)> {
    let (filter, page) = q.split();
    Ok(Json(state.repo.get_users(&filter, page).await))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<User>, (StatusCode, String)> {
    state
        .repo
        .get_user_by_id(id)
        .await
        .map(Json)
        .map_err(http_error)
}

#[instrument(skip(state, patch))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, (StatusCode, String)> {
    if let Some(tz) = &patch.timezone {
        UserZone::parse(tz).map_err(http_error)?;
    }
    let user = state.repo.update_user(id, patch).await.map_err(http_error)?;
    info!(actor, user_id = id, "user updated");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.repo.delete_user(id).await.map_err(http_error)?;
    info!(actor, user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
