use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Request body for account signup.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    /// Unique username (1-32 chars, alphanumeric and underscores).
    #[schema(example = "alice_wonder")]
    pub username: String,
    /// Contact email.
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        return Err(AppError::Validation(
            "Username must be 1-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    Ok(())
}

pub fn validate_signup_request(payload: &SignupRequest) -> Result<(), AppError> {
    validate_username(&payload.username)?;
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

/// Successful signup response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    pub ok: bool,
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token valid for 7 days.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "alice_wonder")]
    pub username: String,
}

/// Request body for the post-OAuth username check.
///
/// `user_id` is the identity the external provider assigned; it doubles as
/// the user row's primary key.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct OauthCallbackRequest {
    pub user_id: Uuid,
    #[schema(example = "alice@example.com")]
    pub email: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OauthCallbackResponse {
    /// True when the identity still has to pick a username.
    pub need_username: bool,
    /// Present when the identity is fully set up.
    pub token: Option<String>,
}

/// Request body for assigning a username to an OAuth identity.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct OauthUsernameRequest {
    pub user_id: Uuid,
    #[schema(example = "alice_wonder")]
    pub username: String,
    pub email: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OauthUsernameResponse {
    pub ok: bool,
    pub token: String,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: String,
    #[schema(example = "alice_wonder")]
    pub username: String,
    pub email: Option<String>,
}
