use serde::{Deserialize, Serialize};

use crate::domain::PostStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Public projection of a user, as returned by the profile endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub bookmarks: Vec<String>,
    pub name: String,
    pub profile_picture: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub author: String,
    pub status: PostStatus,
    pub tags: Vec<String>,
    pub likes: Vec<String>,
    pub bookmarks: Vec<String>,
    /// Top-level comment ids, oldest first
    pub comments: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
}

/// Flattened search result with the author resolved and engagement counted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Author username
    pub author: String,
    /// Author display name
    pub name: String,
    pub likes: i64,
    pub comments: i64,
    pub bookmarks: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub user: String,
    pub blog_post: String,
    pub parent_comment: Option<String>,
    pub replies: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: String,
    pub name: String,
}

/// A comment with its author resolved and its replies resolved one level deep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: String,
    pub text: String,
    pub user: CommentAuthor,
    pub blog_post: String,
    pub parent_comment: Option<String>,
    pub replies: Vec<CommentReply>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReply {
    pub id: String,
    pub text: String,
    pub user: CommentAuthor,
    pub blog_post: String,
    pub parent_comment: Option<String>,
    pub replies: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}
