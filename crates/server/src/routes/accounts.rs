//! Signup, login and logout handlers

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use super::chat::ChatResponse;
use crate::accounts::SignupOutcome;
use crate::error::AppError;
use crate::state::AppState;

/// Request body for signup and login
#[derive(Debug, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

/// Request body for logout
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    username: String,
}

/// POST /signup - Register a user for this process lifetime
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    match state.accounts.signup(&body.username, &body.password).await {
        SignupOutcome::Created => {
            tracing::info!(username = %body.username, "User signed up");
            Ok((
                StatusCode::CREATED,
                Json(ChatResponse {
                    response: "Account created. Please log in.".to_string(),
                }),
            ))
        }
        SignupOutcome::AlreadyExists => Err(AppError::Conflict(
            "User already exists. Please login.".to_string(),
        )),
    }
}

/// POST /login - Check credentials
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<ChatResponse>, AppError> {
    if !state.accounts.login(&body.username, &body.password).await {
        return Err(AppError::Unauthorized(
            "Invalid credentials, please try again.".to_string(),
        ));
    }

    tracing::info!(username = %body.username, "User logged in");
    Ok(Json(ChatResponse {
        response: format!("Welcome back, {}!", body.username),
    }))
}

/// POST /logout - Only a logged-in user can log out
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<LogoutRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if !state.accounts.logout(&body.username).await {
        return Err(AppError::Unauthorized("You are not logged in.".to_string()));
    }

    tracing::info!(username = %body.username, "User logged out");
    Ok(Json(ChatResponse {
        response: "You have been logged out.".to_string(),
    }))
}
