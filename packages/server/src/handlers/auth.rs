use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, MeResponse, OauthCallbackRequest, OauthCallbackResponse,
    OauthUsernameRequest, OauthUsernameResponse, SignupRequest, SignupResponse,
    validate_login_request, validate_signup_request, validate_username,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// Handle account signup. Username uniqueness is checked before the
/// identity is created.
#[utoipa::path(post, path = "/auth/signup", tag = "Auth")]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_signup_request(&payload)?;

    let username = payload.username.trim().to_string();

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::UsernameTaken);
    }

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        id: Set(Uuid::now_v7()),
        username: Set(Some(username)),
        email: Set(Some(payload.email.trim().to_string())),
        password_hash: Set(Some(password_hash)),
        created_at: Set(Utc::now()),
    };

    new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Signup race condition: unique constraint caught on insert");
            AppError::UsernameTaken
        }
        _ => AppError::from(e),
    })?;

    Ok((StatusCode::CREATED, Json(SignupResponse { ok: true })))
}

/// Handle login.
#[utoipa::path(post, path = "/auth/login", tag = "Auth")]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let username = payload.username.trim();

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    // OAuth identities have no password.
    let stored = user
        .password_hash
        .as_deref()
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, stored)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let username = user.username.ok_or(AppError::InvalidCredentials)?;
    let token = jwt::sign(user.id, &username, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse { token, username }))
}

/// Post-OAuth username check: tells the client whether the identity still
/// has to pick a username, and hands out a token when it does not.
#[utoipa::path(post, path = "/auth/oauth/callback", tag = "Auth")]
#[instrument(skip(state, payload), fields(user_id = %payload.user_id))]
pub async fn oauth_callback(
    State(state): State<AppState>,
    AppJson(payload): AppJson<OauthCallbackRequest>,
) -> Result<Json<OauthCallbackResponse>, AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }

    let user = user::Entity::find_by_id(payload.user_id)
        .one(&state.db)
        .await?;

    if let Some(user) = user
        && let Some(username) = user.username.clone()
    {
        let token = jwt::sign(user.id, &username, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;
        return Ok(Json(OauthCallbackResponse {
            need_username: false,
            token: Some(token),
        }));
    }

    Ok(Json(OauthCallbackResponse {
        need_username: true,
        token: None,
    }))
}

/// Assign a username to an OAuth identity, creating the user row when the
/// provider-assigned identity has none yet. Usernames are set once.
#[utoipa::path(post, path = "/auth/oauth/username", tag = "Auth")]
#[instrument(skip(state, payload), fields(user_id = %payload.user_id, username = %payload.username))]
pub async fn oauth_username(
    State(state): State<AppState>,
    AppJson(payload): AppJson<OauthUsernameRequest>,
) -> Result<Json<OauthUsernameResponse>, AppError> {
    validate_username(&payload.username)?;
    let username = payload.username.trim().to_string();

    let taken = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await?;
    if taken.is_some() {
        return Err(AppError::UsernameTaken);
    }

    let existing = user::Entity::find_by_id(payload.user_id)
        .one(&state.db)
        .await?;

    let user = match existing {
        None => {
            let new_user = user::ActiveModel {
                id: Set(payload.user_id),
                username: Set(Some(username.clone())),
                email: Set(payload.email.clone().map(|e| e.trim().to_string())),
                password_hash: Set(None),
                created_at: Set(Utc::now()),
            };
            new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
                _ => AppError::from(e),
            })?
        }
        Some(user) if user.username.is_some() => {
            return Err(AppError::Validation(
                "Username is already set for this account".into(),
            ));
        }
        Some(user) => {
            let mut active: user::ActiveModel = user.into();
            active.username = Set(Some(username.clone()));
            active.update(&state.db).await.map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
                _ => AppError::from(e),
            })?
        }
    };

    let token = jwt::sign(user.id, &username, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(OauthUsernameResponse { ok: true, token }))
}

/// Return the current authenticated user's profile.
#[utoipa::path(get, path = "/auth/me", tag = "Auth", security(("jwt" = [])))]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(MeResponse {
        id: user.id.to_string(),
        username: auth_user.username,
        email: user.email,
    }))
}
