use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Params, TransactionBehavior};

use crate::db::models::{BlogPost, PostSummary, SearchHit};
use crate::db::{new_id, now_timestamp};
use crate::domain::{is_author, Engagement, NewPost, PostPatch, PostStatus, Toggle, ToggleOutcome};
use crate::repository::{RepositoryError, RepositoryResult};
use crate::state::DbPool;

const POST_NOT_FOUND: &str = "Blog post not found!";

#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create(&self, author_id: &str, post: NewPost) -> RepositoryResult<BlogPost>;

    async fn find(&self, id: &str) -> RepositoryResult<Option<BlogPost>>;

    /// Apply `patch` if `actor_id` wrote the post.
    async fn update(&self, id: &str, actor_id: &str, patch: PostPatch)
        -> RepositoryResult<BlogPost>;

    /// Delete the post along with its comments and engagement rows.
    async fn delete(&self, id: &str, actor_id: &str) -> RepositoryResult<()>;

    /// Author's drafts, most recently updated first.
    async fn drafts(&self, author_id: &str) -> RepositoryResult<Vec<BlogPost>>;

    async fn list_by_author(&self, author_id: &str) -> RepositoryResult<Vec<PostSummary>>;

    /// Case-insensitive substring match on titles.
    async fn search_by_title(&self, term: &str) -> RepositoryResult<Vec<SearchHit>>;

    /// Flip `user_id`'s membership in the post's like or bookmark set.
    async fn toggle(
        &self,
        post_id: &str,
        user_id: &str,
        kind: Engagement,
    ) -> RepositoryResult<Toggle>;
}

pub struct SqliteBlogRepository {
    pool: DbPool,
}

impl SqliteBlogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str =
    "id, title, content, image, author_id, status, tags_json, created_at, updated_at";

fn member_ids(conn: &Connection, kind: Engagement, post_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT user_id FROM {} WHERE post_id = ?1 ORDER BY created_at ASC",
        kind.table()
    ))?;
    let ids = stmt
        .query_map(params![post_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn top_level_comment_ids(conn: &Connection, post_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM comments
         WHERE post_id = ?1 AND parent_comment_id IS NULL
         ORDER BY rowid ASC",
    )?;
    let ids = stmt
        .query_map(params![post_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn query_posts<P: Params>(conn: &Connection, sql: &str, params: P) -> RepositoryResult<Vec<BlogPost>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(id, title, content, image, author, status, tags_json, created_at, updated_at)|
             -> RepositoryResult<BlogPost> {
                let status: PostStatus = status.parse()?;
                let tags: Vec<String> = serde_json::from_str(&tags_json)?;
                Ok(BlogPost {
                    likes: member_ids(conn, Engagement::Like, &id)?,
                    bookmarks: member_ids(conn, Engagement::Bookmark, &id)?,
                    comments: top_level_comment_ids(conn, &id)?,
                    id,
                    title,
                    content,
                    image,
                    author,
                    status,
                    tags,
                    created_at,
                    updated_at,
                })
            },
        )
        .collect()
}

fn load_post(conn: &Connection, id: &str) -> RepositoryResult<Option<BlogPost>> {
    let mut posts = query_posts(
        conn,
        &format!("SELECT {} FROM blog_posts WHERE id = ?1", POST_COLUMNS),
        params![id],
    )?;
    Ok(posts.pop())
}

fn post_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM blog_posts WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
}

/// Search key for a title. Folded in Rust so non-ASCII letters compare
/// case-insensitively too.
fn fold_title(title: &str) -> String {
    title.to_lowercase()
}

#[async_trait]
impl BlogRepository for SqliteBlogRepository {
    async fn create(&self, author_id: &str, post: NewPost) -> RepositoryResult<BlogPost> {
        let conn = self.pool.get()?;

        let id = new_id();
        let now = now_timestamp();
        let tags_json = serde_json::to_string(&post.tags)?;

        conn.execute(
            "INSERT INTO blog_posts (id, title, title_folded, content, image, author_id, status, tags_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                id,
                post.title,
                fold_title(&post.title),
                post.content,
                post.image,
                author_id,
                post.status.as_str(),
                tags_json,
                now
            ],
        )?;

        tracing::info!(post_id = %id, author_id, "Blog post created");

        Ok(BlogPost {
            id,
            title: post.title,
            content: post.content,
            image: post.image,
            author: author_id.to_string(),
            status: post.status,
            tags: post.tags,
            likes: Vec::new(),
            bookmarks: Vec::new(),
            comments: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn find(&self, id: &str) -> RepositoryResult<Option<BlogPost>> {
        let conn = self.pool.get()?;
        load_post(&conn, id)
    }

    async fn update(
        &self,
        id: &str,
        actor_id: &str,
        patch: PostPatch,
    ) -> RepositoryResult<BlogPost> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut post = load_post(&tx, id)?
            .ok_or_else(|| RepositoryError::NotFound(POST_NOT_FOUND.into()))?;
        if !is_author(&post, actor_id) {
            return Err(RepositoryError::Forbidden(
                "You are not authorized to update this blog post".into(),
            ));
        }

        patch.apply(&mut post);
        post.updated_at = now_timestamp();

        tx.execute(
            "UPDATE blog_posts
             SET title = ?1, title_folded = ?2, content = ?3, image = ?4, status = ?5,
                 tags_json = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                post.title,
                fold_title(&post.title),
                post.content,
                post.image,
                post.status.as_str(),
                serde_json::to_string(&post.tags)?,
                post.updated_at,
                id
            ],
        )?;
        tx.commit()?;

        tracing::info!(post_id = %id, status = %post.status, "Blog post updated");
        Ok(post)
    }

    async fn delete(&self, id: &str, actor_id: &str) -> RepositoryResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let author: String = tx
            .query_row(
                "SELECT author_id FROM blog_posts WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound(POST_NOT_FOUND.into()))?;
        if author != actor_id {
            return Err(RepositoryError::Forbidden(
                "You are not authorized to delete this blog post".into(),
            ));
        }

        // Comments, reply links, likes and bookmarks go with it (ON DELETE CASCADE)
        tx.execute("DELETE FROM blog_posts WHERE id = ?1", params![id])?;
        tx.commit()?;

        tracing::info!(post_id = %id, "Blog post deleted");
        Ok(())
    }

    async fn drafts(&self, author_id: &str) -> RepositoryResult<Vec<BlogPost>> {
        let conn = self.pool.get()?;
        query_posts(
            &conn,
            &format!(
                "SELECT {} FROM blog_posts
                 WHERE author_id = ?1 AND status = 'draft'
                 ORDER BY updated_at DESC, rowid DESC",
                POST_COLUMNS
            ),
            params![author_id],
        )
    }

    async fn list_by_author(&self, author_id: &str) -> RepositoryResult<Vec<PostSummary>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, title FROM blog_posts
             WHERE author_id = ?1
             ORDER BY updated_at DESC, rowid DESC",
        )?;
        let posts = stmt
            .query_map(params![author_id], |row| {
                Ok(PostSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    async fn search_by_title(&self, term: &str) -> RepositoryResult<Vec<SearchHit>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.title, p.content, p.tags_json, u.username, u.name,
                    (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id),
                    (SELECT COUNT(*) FROM comments c
                     WHERE c.post_id = p.id AND c.parent_comment_id IS NULL),
                    (SELECT COUNT(*) FROM post_bookmarks b WHERE b.post_id = p.id),
                    p.created_at, p.updated_at
             FROM blog_posts p
             JOIN users u ON u.id = p.author_id
             WHERE instr(p.title_folded, ?1) > 0
             ORDER BY p.updated_at DESC, p.rowid DESC",
        )?;

        let rows = stmt
            .query_map(params![fold_title(term)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, i64>(8)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, String>(10)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(
                    id,
                    title,
                    content,
                    tags_json,
                    author,
                    name,
                    likes,
                    comments,
                    bookmarks,
                    created_at,
                    updated_at,
                )|
                 -> RepositoryResult<SearchHit> {
                    Ok(SearchHit {
                        id,
                        title,
                        content,
                        tags: serde_json::from_str(&tags_json)?,
                        author,
                        name,
                        likes,
                        comments,
                        bookmarks,
                        created_at,
                        updated_at,
                    })
                },
            )
            .collect()
    }

    async fn toggle(
        &self,
        post_id: &str,
        user_id: &str,
        kind: Engagement,
    ) -> RepositoryResult<Toggle> {
        let mut conn = self.pool.get()?;
        // The write lock is taken up front so concurrent toggles serialize
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !post_exists(&tx, post_id)? {
            return Err(RepositoryError::NotFound(POST_NOT_FOUND.into()));
        }

        let removed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE post_id = ?1 AND user_id = ?2",
                kind.table()
            ),
            params![post_id, user_id],
        )?;

        let outcome = if removed > 0 {
            ToggleOutcome::Removed
        } else {
            tx.execute(
                &format!(
                    "INSERT INTO {} (post_id, user_id, created_at) VALUES (?1, ?2, ?3)",
                    kind.table()
                ),
                params![post_id, user_id, now_timestamp()],
            )?;
            ToggleOutcome::Added
        };

        let count: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE post_id = ?1", kind.table()),
            params![post_id],
            |row| row.get(0),
        )?;
        tx.commit()?;

        tracing::debug!(post_id, user_id, ?kind, ?outcome, "Engagement toggled");
        Ok(Toggle {
            kind,
            outcome,
            count,
        })
    }
}
