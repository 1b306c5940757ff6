use std::collections::HashMap;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::db::models::{Comment, CommentAuthor, CommentReply, CommentThread};
use crate::db::{new_id, now_timestamp};
use crate::domain::NewComment;
use crate::repository::{RepositoryError, RepositoryResult};
use crate::state::DbPool;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment on `post_id`. A reply is linked into its parent's
    /// reply list when the parent exists; a reply to a missing parent is
    /// still stored, unlinked.
    async fn create(
        &self,
        post_id: &str,
        author_id: &str,
        comment: NewComment,
    ) -> RepositoryResult<Comment>;

    async fn find(&self, id: &str) -> RepositoryResult<Option<Comment>>;

    /// Every comment on the post in insertion order, replies resolved one level.
    async fn thread_for_post(&self, post_id: &str) -> RepositoryResult<Vec<CommentThread>>;
}

pub struct SqliteCommentRepository {
    pool: DbPool,
}

impl SqliteCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

struct CommentRow {
    id: String,
    text: String,
    author: CommentAuthor,
    post_id: String,
    parent_comment_id: Option<String>,
    created_at: String,
    updated_at: String,
}

fn reply_ids(conn: &Connection, parent_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT reply_id FROM comment_replies WHERE parent_id = ?1 ORDER BY position")?;
    let ids = stmt
        .query_map(params![parent_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

/// Reply ids of every comment on a post, keyed by parent.
fn reply_index(conn: &Connection, post_id: &str) -> rusqlite::Result<HashMap<String, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT r.parent_id, r.reply_id
         FROM comment_replies r
         JOIN comments c ON c.id = r.parent_id
         WHERE c.post_id = ?1
         ORDER BY r.position",
    )?;
    let pairs = stmt
        .query_map(params![post_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    for (parent, reply) in pairs {
        index.entry(parent).or_default().push(reply);
    }
    Ok(index)
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    async fn create(
        &self,
        post_id: &str,
        author_id: &str,
        comment: NewComment,
    ) -> RepositoryResult<Comment> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let post_exists: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM blog_posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        if !post_exists {
            return Err(RepositoryError::NotFound("Blog post not found!".into()));
        }

        // Post of the parent comment, if the parent exists
        let parent_post: Option<String> = match &comment.parent_comment_id {
            Some(parent_id) => tx
                .query_row(
                    "SELECT post_id FROM comments WHERE id = ?1",
                    params![parent_id],
                    |row| row.get(0),
                )
                .optional()?,
            None => None,
        };
        if matches!(&parent_post, Some(p) if p != post_id) {
            return Err(RepositoryError::Invalid(
                "Parent comment belongs to a different blog post".into(),
            ));
        }

        let id = new_id();
        let now = now_timestamp();
        tx.execute(
            "INSERT INTO comments (id, text, user_id, post_id, parent_comment_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![id, comment.text, author_id, post_id, comment.parent_comment_id, now],
        )?;

        if let Some(parent_id) = &comment.parent_comment_id {
            if parent_post.is_some() {
                tx.execute(
                    "INSERT INTO comment_replies (parent_id, reply_id) VALUES (?1, ?2)",
                    params![parent_id, id],
                )?;
            } else {
                tracing::warn!(
                    comment_id = %id,
                    parent_id = %parent_id,
                    "Parent comment not found, reply stored unlinked"
                );
            }
        }
        tx.commit()?;

        Ok(Comment {
            id,
            text: comment.text,
            user: author_id.to_string(),
            blog_post: post_id.to_string(),
            parent_comment: comment.parent_comment_id,
            replies: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn find(&self, id: &str) -> RepositoryResult<Option<Comment>> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                "SELECT id, text, user_id, post_id, parent_comment_id, created_at, updated_at
                 FROM comments WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Comment {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        user: row.get(2)?,
                        blog_post: row.get(3)?,
                        parent_comment: row.get(4)?,
                        replies: Vec::new(),
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                },
            )
            .optional()?;

        match comment {
            Some(mut comment) => {
                comment.replies = reply_ids(&conn, &comment.id)?;
                Ok(Some(comment))
            }
            None => Ok(None),
        }
    }

    async fn thread_for_post(&self, post_id: &str) -> RepositoryResult<Vec<CommentThread>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT c.id, c.text, u.id, u.name, c.post_id, c.parent_comment_id,
                    c.created_at, c.updated_at
             FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.post_id = ?1
             ORDER BY c.rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![post_id], |row| {
                Ok(CommentRow {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    author: CommentAuthor {
                        id: row.get(2)?,
                        name: row.get(3)?,
                    },
                    post_id: row.get(4)?,
                    parent_comment_id: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let replies_of = reply_index(&conn, post_id)?;
        let by_id: HashMap<&str, &CommentRow> = rows.iter().map(|r| (r.id.as_str(), r)).collect();

        let resolve_reply = |reply: &CommentRow, replies_of: &HashMap<String, Vec<String>>| {
            CommentReply {
                id: reply.id.clone(),
                text: reply.text.clone(),
                user: reply.author.clone(),
                blog_post: reply.post_id.clone(),
                parent_comment: reply.parent_comment_id.clone(),
                replies: replies_of.get(&reply.id).cloned().unwrap_or_default(),
                created_at: reply.created_at.clone(),
                updated_at: reply.updated_at.clone(),
            }
        };

        let threads = rows
            .iter()
            .map(|row| {
                let replies = replies_of
                    .get(&row.id)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|id| by_id.get(id.as_str()).copied())
                            .map(|reply| resolve_reply(reply, &replies_of))
                            .collect()
                    })
                    .unwrap_or_default();

                CommentThread {
                    id: row.id.clone(),
                    text: row.text.clone(),
                    user: row.author.clone(),
                    blog_post: row.post_id.clone(),
                    parent_comment: row.parent_comment_id.clone(),
                    replies,
                    created_at: row.created_at.clone(),
                    updated_at: row.updated_at.clone(),
                }
            })
            .collect();

        Ok(threads)
    }
}
