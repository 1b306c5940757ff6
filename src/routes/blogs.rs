use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::models::{BlogPost, PostSummary, SearchHit};
use crate::domain::{Engagement, NewPost, PostPatch};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct PostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub title: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct BlogCreated {
    pub message: &'static str,
    pub blog: BlogPost,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogUpdated {
    pub message: &'static str,
    pub blog_post: BlogPost,
}

#[derive(Serialize)]
pub struct BlogDeleted {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct SearchResults {
    pub message: &'static str,
    pub blogs: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct LikeToggled {
    pub message: &'static str,
    pub liked: bool,
    pub likes: i64,
}

#[derive(Serialize)]
pub struct BookmarkToggled {
    pub message: &'static str,
    pub bookmarked: bool,
    pub bookmarks: i64,
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/blogs", post(create_post))
        .route("/api/blogs/drafts", get(drafts))
        .route("/api/blogs/postlist", get(post_list))
        .route("/api/blogs/search", get(search))
        .route("/api/blogs/{id}", put(update_post).delete(delete_post))
        .route("/api/blogs/{id}/like", post(toggle_like))
        .route("/api/blogs/{id}/bookmark", post(toggle_bookmark))
}

// -- Handlers --

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<PostRequest>,
) -> AppResult<(StatusCode, Json<BlogCreated>)> {
    let post = NewPost::new(
        req.title.as_deref(),
        req.content.as_deref(),
        req.status.as_deref(),
        req.tags,
        req.image.as_deref(),
    )?;

    let blog = state.blogs.create(&user.id, post).await?;

    Ok((
        StatusCode::CREATED,
        Json(BlogCreated {
            message: "Blog post created successfully!",
            blog,
        }),
    ))
}

async fn drafts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<BlogPost>>> {
    let drafts = state.blogs.drafts(&user.id).await?;
    Ok(Json(drafts))
}

async fn post_list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<PostSummary>>> {
    let posts = state.blogs.list_by_author(&user.id).await?;
    if posts.is_empty() {
        return Err(AppError::NotFound("No blog posts found".into()));
    }
    Ok(Json(posts))
}

async fn search(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SearchResults>> {
    let term = query
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Title is required to search for blogs!".into()))?;

    let blogs = state.blogs.search_by_title(term).await?;
    if blogs.is_empty() {
        return Err(AppError::NotFound(
            "No blogs found with the given title!".into(),
        ));
    }

    Ok(Json(SearchResults {
        message: "Blogs fetched successfully!",
        blogs,
    }))
}

async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<PostRequest>,
) -> AppResult<Json<BlogUpdated>> {
    let patch = PostPatch::new(
        req.title.as_deref(),
        req.content.as_deref(),
        req.status.as_deref(),
        req.tags,
        req.image.as_deref(),
    )?;

    let blog_post = state.blogs.update(&id, &user.id, patch).await?;

    Ok(Json(BlogUpdated {
        message: "Blog post updated successfully!",
        blog_post,
    }))
}

async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<BlogDeleted>> {
    state.blogs.delete(&id, &user.id).await?;
    Ok(Json(BlogDeleted {
        message: "Blog post deleted successfully!",
    }))
}

async fn toggle_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<LikeToggled>> {
    let toggle = state.blogs.toggle(&id, &user.id, Engagement::Like).await?;
    Ok(Json(LikeToggled {
        message: toggle.message(),
        liked: toggle.is_member(),
        likes: toggle.count,
    }))
}

async fn toggle_bookmark(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<BookmarkToggled>> {
    let toggle = state
        .blogs
        .toggle(&id, &user.id, Engagement::Bookmark)
        .await?;
    Ok(Json(BookmarkToggled {
        message: toggle.message(),
        bookmarked: toggle.is_member(),
        bookmarks: toggle.count,
    }))
}
