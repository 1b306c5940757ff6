use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;

use crate::auth::session::{find_session_user, get_cookie_value};
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
}

/// Extractor that requires authentication.
/// Returns 401 if the session cookie is missing, unknown or expired.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = get_cookie_value(&parts.headers, &state.config.auth.cookie_name)
            .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".into()))?;

        let user = find_session_user(&state.db, token)?
            .ok_or_else(|| AppError::Unauthorized("Not authorized, token failed".into()))?;

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
        })
    }
}

/// JSON request body whose rejections (bad syntax, wrong field types,
/// missing content type) surface as a 400 with a JSON message.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}
