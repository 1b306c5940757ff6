// Domain types - pure, no side effects
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::models::BlogPost;

/// Input rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(ValidationError(format!(
                "Invalid status '{}': expected 'draft' or 'published'",
                other
            ))),
        }
    }
}

/// Per-user membership sets kept on a blog post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Like,
    Bookmark,
}

impl Engagement {
    /// Table holding the `(post_id, user_id)` membership rows.
    pub fn table(&self) -> &'static str {
        match self {
            Engagement::Like => "post_likes",
            Engagement::Bookmark => "post_bookmarks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Result of flipping one user's membership in a post's like or bookmark set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    pub kind: Engagement,
    pub outcome: ToggleOutcome,
    /// Set size after the toggle
    pub count: i64,
}

impl Toggle {
    pub fn is_member(&self) -> bool {
        self.outcome == ToggleOutcome::Added
    }

    pub fn message(&self) -> &'static str {
        match (self.kind, self.outcome) {
            (Engagement::Like, ToggleOutcome::Added) => "Blog post liked!",
            (Engagement::Like, ToggleOutcome::Removed) => "Blog post unliked!",
            (Engagement::Bookmark, ToggleOutcome::Added) => "Blog post bookmarked!",
            (Engagement::Bookmark, ToggleOutcome::Removed) => "Blog post removed from bookmarks!",
        }
    }
}

/// Treats empty strings like absent values.
fn provided(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub tags: Vec<String>,
    pub image: Option<String>,
}

impl NewPost {
    pub fn new(
        title: Option<&str>,
        content: Option<&str>,
        status: Option<&str>,
        tags: Option<Vec<String>>,
        image: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let (Some(title), Some(content)) = (provided(title), provided(content)) else {
            return Err(ValidationError::new("Title and content are required!"));
        };

        let status = match provided(status) {
            Some(s) => s.parse()?,
            None => PostStatus::Draft,
        };

        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            status,
            tags: tags.unwrap_or_default(),
            image: provided(image).map(str::to_string),
        })
    }
}

/// Partial update of a post. Empty strings keep the stored value; a provided
/// tag list (even an empty one) replaces the stored tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
}

impl PostPatch {
    pub fn new(
        title: Option<&str>,
        content: Option<&str>,
        status: Option<&str>,
        tags: Option<Vec<String>>,
        image: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let status = provided(status).map(str::parse).transpose()?;
        Ok(Self {
            title: provided(title).map(str::to_string),
            content: provided(content).map(str::to_string),
            status,
            tags,
            image: provided(image).map(str::to_string),
        })
    }

    pub fn apply(self, post: &mut BlogPost) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(status) = self.status {
            post.status = status;
        }
        if let Some(tags) = self.tags {
            post.tags = tags;
        }
        if let Some(image) = self.image {
            post.image = Some(image);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub text: String,
    pub parent_comment_id: Option<String>,
}

impl NewComment {
    pub fn new(text: Option<&str>, parent_comment_id: Option<&str>) -> Result<Self, ValidationError> {
        let text = text.map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(ValidationError::new("Comment text is required!"));
        }
        Ok(Self {
            text: text.to_string(),
            parent_comment_id: provided(parent_comment_id).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub profile_picture: Option<String>,
}

impl Registration {
    pub fn new(
        name: Option<&str>,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
        profile_picture: Option<&str>,
    ) -> Result<Self, ValidationError> {
        match (
            provided(name),
            provided(username),
            provided(email),
            provided(password),
        ) {
            (Some(name), Some(username), Some(email), Some(password)) => Ok(Self {
                name: name.to_string(),
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                profile_picture: provided(profile_picture).map(str::to_string),
            }),
            _ => Err(ValidationError::new("All fields are required!")),
        }
    }
}

/// Profile changes. Email and password are always resent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    pub fn new(
        email: Option<&str>,
        password: Option<&str>,
        username: Option<&str>,
        profile_picture: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let email = provided(email).ok_or_else(|| ValidationError::new("Email is required"))?;
        let password =
            provided(password).ok_or_else(|| ValidationError::new("Password is required"))?;
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
            username: provided(username).map(str::to_string),
            profile_picture: provided(profile_picture).map(str::to_string),
        })
    }
}

/// Mutations on a post are reserved to its author.
pub fn is_author(post: &BlogPost, actor_id: &str) -> bool {
    post.author == actor_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> BlogPost {
        BlogPost {
            id: "p1".into(),
            title: "Original".into(),
            content: "Body".into(),
            image: None,
            author: "u1".into(),
            status: PostStatus::Draft,
            tags: vec!["rust".into()],
            likes: vec![],
            bookmarks: vec![],
            comments: vec![],
            created_at: "2024-01-01T00:00:00.000000Z".into(),
            updated_at: "2024-01-01T00:00:00.000000Z".into(),
        }
    }

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!("draft".parse::<PostStatus>().unwrap(), PostStatus::Draft);
        assert_eq!(
            "published".parse::<PostStatus>().unwrap(),
            PostStatus::Published
        );
        assert!("archived".parse::<PostStatus>().is_err());
        assert!("Draft".parse::<PostStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&PostStatus::Published).unwrap();
        assert_eq!(json, "\"published\"");
    }

    #[test]
    fn new_post_defaults_to_draft_without_tags() {
        let post = NewPost::new(Some("Title"), Some("Body"), None, None, None).unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.tags.is_empty());
        assert!(post.image.is_none());
    }

    #[test]
    fn new_post_requires_title_and_content() {
        let err = NewPost::new(Some(""), Some("Body"), None, None, None).unwrap_err();
        assert_eq!(err.0, "Title and content are required!");
        assert!(NewPost::new(Some("Title"), None, None, None, None).is_err());
    }

    #[test]
    fn new_post_rejects_unknown_status() {
        assert!(NewPost::new(Some("T"), Some("C"), Some("hidden"), None, None).is_err());
    }

    #[test]
    fn patch_keeps_stored_values_for_empty_strings() {
        let mut post = sample_post();
        let patch = PostPatch::new(Some(""), Some(""), Some(""), None, Some("")).unwrap();
        patch.apply(&mut post);
        assert_eq!(post.title, "Original");
        assert_eq!(post.content, "Body");
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.tags, vec!["rust".to_string()]);
    }

    #[test]
    fn patch_overwrites_provided_fields() {
        let mut post = sample_post();
        let patch = PostPatch::new(None, None, Some("published"), Some(vec![]), None).unwrap();
        patch.apply(&mut post);
        assert_eq!(post.title, "Original");
        assert_eq!(post.status, PostStatus::Published);
        assert!(post.tags.is_empty());
    }

    #[test]
    fn comment_text_is_trimmed_and_required() {
        assert!(NewComment::new(Some("   "), None).is_err());
        assert!(NewComment::new(None, None).is_err());
        let c = NewComment::new(Some("  hi "), Some("")).unwrap();
        assert_eq!(c.text, "hi");
        assert!(c.parent_comment_id.is_none());
    }

    #[test]
    fn registration_requires_every_field() {
        assert!(Registration::new(Some("A"), Some("a"), Some("a@x.io"), None, None).is_err());
        let reg = Registration::new(Some("A"), Some("a"), Some("a@x.io"), Some("pw"), None).unwrap();
        assert_eq!(reg.username, "a");
    }

    #[test]
    fn profile_update_requires_email_then_password() {
        let err = ProfileUpdate::new(None, None, None, None).unwrap_err();
        assert_eq!(err.0, "Email is required");
        let err = ProfileUpdate::new(Some("a@x.io"), Some(""), None, None).unwrap_err();
        assert_eq!(err.0, "Password is required");
    }

    #[test]
    fn toggle_messages() {
        let liked = Toggle {
            kind: Engagement::Like,
            outcome: ToggleOutcome::Added,
            count: 1,
        };
        assert_eq!(liked.message(), "Blog post liked!");
        assert!(liked.is_member());

        let unbookmarked = Toggle {
            kind: Engagement::Bookmark,
            outcome: ToggleOutcome::Removed,
            count: 0,
        };
        assert_eq!(
            unbookmarked.message(),
            "Blog post removed from bookmarks!"
        );
    }

    #[test]
    fn authorship_is_identity_equality() {
        let post = sample_post();
        assert!(is_author(&post, "u1"));
        assert!(!is_author(&post, "u2"));
    }
}
