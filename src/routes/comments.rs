use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::models::{Comment, CommentThread};
use crate::domain::NewComment;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub text: Option<String>,
    pub parent_comment_id: Option<String>,
}

#[derive(Serialize)]
pub struct CommentCreated {
    pub message: &'static str,
    pub comment: Comment,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/blogs/{id}/comments",
        get(list_comments).post(create_comment),
    )
}

/// POST /api/blogs/{id}/comments - comment on a post, or reply with `parentCommentId`
async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    JsonBody(req): JsonBody<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentCreated>)> {
    let comment = NewComment::new(req.text.as_deref(), req.parent_comment_id.as_deref())?;
    let comment = state.comments.create(&post_id, &user.id, comment).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentCreated {
            message: "Comment added successfully!",
            comment,
        }),
    ))
}

async fn list_comments(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Json<Vec<CommentThread>>> {
    let comments = state.comments.thread_for_post(&post_id).await?;
    if comments.is_empty() {
        return Err(AppError::NotFound(
            "No comments found for this blog post!".into(),
        ));
    }
    Ok(Json(comments))
}
