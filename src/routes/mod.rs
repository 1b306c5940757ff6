pub mod blogs;
pub mod comments;
pub mod users;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full API router with request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(users::router())
        .merge(blogs::router())
        .merge(comments::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
