//! Authentication and account handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthTokens, CreateUserInput, UserProfile};
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthTokens>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login(body.username.trim(), &body.password).await?;
    Ok(Json(tokens))
}

/// Register the first account of a fresh installation as superuser
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let profile = auth_service.bootstrap(body).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<AuthTokens>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.refresh_token(&body.refresh_token).await?;
    Ok(Json(tokens))
}

/// Profile of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let profile = auth_service.get_profile(user.user_id).await?;
    Ok(Json(profile))
}

/// Create an account. Superusers only.
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    user.require_superuser()?;

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let profile = auth_service.create_user(body).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}
