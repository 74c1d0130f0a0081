use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, validate_password, verify_password},
    },
    error::{http_error, ErrorKind},
    state::AppState,
    tz::UserZone,
    users::repo_types::{NewUser, PassportKey, User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/refresh", post(refresh))
}

fn issue_tokens(keys: &JwtKeys, user: User) -> Result<AuthResponse, (StatusCode, String)> {
    let access_token = keys.sign_access(user.id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let refresh_token = keys.sign_refresh(user.id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user,
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let key: PassportKey = payload.passport.parse().map_err(|e| {
        warn!(passport = %payload.passport, "invalid passport");
        http_error(e)
    })?;
    validate_password(&payload.password).map_err(http_error)?;

    let timezone = payload
        .timezone
        .unwrap_or_else(|| state.config.defaults.timezone.clone());
    UserZone::parse(&timezone).map_err(http_error)?;

    let hash = hash_password(&payload.password).map_err(http_error)?;
    let new = NewUser {
        default_end_time: payload
            .default_end_time
            .or(state.config.defaults.default_end_time),
        password_hash: Some(hash),
        ..NewUser::new(key, timezone)
    };

    let user = state.repo.insert_user(new).await.map_err(|e| {
        if e.kind() == ErrorKind::Conflict {
            warn!(%key, "passport already registered");
        }
        http_error(e)
    })?;

    info!(user_id = user.id, %key, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok((StatusCode::CREATED, Json(issue_tokens(&keys, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let key: PassportKey = payload.passport.parse().map_err(http_error)?;

    let user = match state.repo.get_user(key).await {
        Ok(u) => u,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(%key, "login unknown passport");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => return Err(http_error(e)),
    };

    let ok = verify_password(&payload.password, user.password_hash.as_deref()).map_err(http_error)?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    info!(user_id = user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let user = match state.repo.get_user_by_id(claims.sub).await {
        Ok(u) => u,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err((StatusCode::UNAUTHORIZED, "User not found".into()));
        }
        Err(e) => return Err(http_error(e)),
    };
    Ok(Json(issue_tokens(&keys, user)?))
}
