use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::repository::{
    BlogRepository, CommentRepository, SqliteBlogRepository, SqliteCommentRepository,
    SqliteUserRepository, UserRepository,
};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub users: Arc<dyn UserRepository>,
    pub blogs: Arc<dyn BlogRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl AppState {
    /// State backed by the SQLite repositories over `db`.
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            users: Arc::new(SqliteUserRepository::new(db.clone())),
            blogs: Arc::new(SqliteBlogRepository::new(db.clone())),
            comments: Arc::new(SqliteCommentRepository::new(db.clone())),
            db,
            config,
        }
    }
}
