use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{
    clear_session_cookie, create_session, delete_session, get_cookie_value, session_cookie,
};
use crate::db::models::{Profile, User};
use crate::domain::{ProfileUpdate, Registration};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
    pub profile_picture: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: RegisteredUser,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(register))
        .route("/api/users/auth", post(login))
        .route("/api/users/logout", post(logout))
        .route("/api/users/profile", get(profile).put(update_profile))
}

fn login_cookie(state: &AppState, user: &User) -> AppResult<String> {
    let hours = state.config.auth.session_hours;
    let token = create_session(&state.db, &user.id, hours)?;
    Ok(session_cookie(&state.config.auth.cookie_name, &token, hours))
}

// -- Handlers --

/// POST /api/users - register and sign in
async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> AppResult<Response> {
    let registration = Registration::new(
        req.name.as_deref(),
        req.username.as_deref(),
        req.email.as_deref(),
        req.password.as_deref(),
        req.profile_picture.as_deref(),
    )?;

    let password_hash = hash_password(&registration.password, state.config.auth.bcrypt_cost)?;
    let user = state.users.create(&registration, &password_hash).await?;
    let cookie = login_cookie(&state, &user)?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let body = RegisterResponse {
        message: "User created successfully!",
        user: RegisteredUser {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            profile_picture: user.profile_picture,
        },
    };

    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /api/users/auth - email + password login
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<Response> {
    let (Some(email), Some(password)) = (
        req.email.as_deref().filter(|s| !s.is_empty()),
        req.password.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    };

    let user = state
        .users
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !verify_password(password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid Password".into()));
    }

    let cookie = login_cookie(&state, &user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    let body = LoginResponse {
        id: user.id,
        username: user.username,
        name: user.name,
        email: user.email,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /api/users/logout - drop the session and expire the cookie
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;

    if let Some(token) = get_cookie_value(&headers, cookie_name) {
        if let Err(e) = delete_session(&state.db, token) {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie(cookie_name))],
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    )
        .into_response())
}

/// GET /api/users/profile
async fn profile(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Profile>> {
    let profile = state.users.profile(&user.id).await?;
    Ok(Json(profile))
}

/// PUT /api/users/profile - email and password must be resent even when unchanged
async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    let update = ProfileUpdate::new(
        req.email.as_deref(),
        req.password.as_deref(),
        req.username.as_deref(),
        req.profile_picture.as_deref(),
    )?;

    let stored = state
        .users
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    // Only rehash when the password actually changed
    let new_hash = if verify_password(&update.password, &stored.password_hash) {
        None
    } else {
        Some(hash_password(
            &update.password,
            state.config.auth.bcrypt_cost,
        )?)
    };

    let profile = state
        .users
        .update_profile(&user.id, &update, new_hash.as_deref())
        .await?;

    tracing::info!(user_id = %user.id, password_changed = new_hash.is_some(), "Profile updated");
    Ok(Json(profile))
}
