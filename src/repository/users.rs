use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::db::models::{Profile, User};
use crate::db::{new_id, now_timestamp};
use crate::domain::{ProfileUpdate, Registration};
use crate::repository::{RepositoryError, RepositoryResult};
use crate::state::DbPool;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Email and username must both be unused.
    async fn create(&self, registration: &Registration, password_hash: &str)
        -> RepositoryResult<User>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>>;

    /// Public projection including the ids of bookmarked posts.
    async fn profile(&self, id: &str) -> RepositoryResult<Profile>;

    /// Apply a profile update. `password_hash` replaces the stored hash when set.
    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
        password_hash: Option<&str>,
    ) -> RepositoryResult<Profile>;
}

pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, name, username, email, password_hash, profile_picture, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        profile_picture: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn load_user(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        user_from_row,
    )
    .optional()
}

fn load_profile(conn: &Connection, id: &str) -> RepositoryResult<Profile> {
    let user = load_user(conn, id)?
        .ok_or_else(|| RepositoryError::NotFound("User not found".into()))?;

    let mut stmt = conn.prepare(
        "SELECT post_id FROM post_bookmarks WHERE user_id = ?1 ORDER BY created_at ASC",
    )?;
    let bookmarks = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(Profile {
        id: user.id,
        username: user.username,
        email: user.email,
        bookmarks,
        name: user.name,
        profile_picture: user.profile_picture,
        created_at: user.created_at,
        updated_at: user.updated_at,
    })
}

/// True when `column = value` belongs to some user other than `except_id`.
fn is_taken(
    conn: &Connection,
    column: &str,
    value: &str,
    except_id: Option<&str>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!(
            "SELECT COUNT(*) > 0 FROM users WHERE {} = ?1 AND id != COALESCE(?2, '')",
            column
        ),
        params![value, except_id],
        |row| row.get(0),
    )
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(
        &self,
        registration: &Registration,
        password_hash: &str,
    ) -> RepositoryResult<User> {
        let mut conn = self.pool.get()?;
        // Uniqueness checks and insert see the same snapshot
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if is_taken(&tx, "email", &registration.email, None)? {
            return Err(RepositoryError::Invalid("User already exists!".into()));
        }
        if is_taken(&tx, "username", &registration.username, None)? {
            return Err(RepositoryError::Invalid("Username is already taken!".into()));
        }

        let now = now_timestamp();
        let user = User {
            id: new_id(),
            name: registration.name.clone(),
            username: registration.username.clone(),
            email: registration.email.clone(),
            password_hash: password_hash.to_string(),
            profile_picture: registration.profile_picture.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        tx.execute(
            "INSERT INTO users (id, name, username, email, password_hash, profile_picture, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id,
                user.name,
                user.username,
                user.email,
                user.password_hash,
                user.profile_picture,
                user.created_at,
                user.updated_at
            ],
        )?;
        tx.commit()?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        let conn = self.pool.get()?;
        Ok(load_user(&conn, id)?)
    }

    async fn profile(&self, id: &str) -> RepositoryResult<Profile> {
        let conn = self.pool.get()?;
        load_profile(&conn, id)
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
        password_hash: Option<&str>,
    ) -> RepositoryResult<Profile> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let user = load_user(&tx, id)?
            .ok_or_else(|| RepositoryError::NotFound("User not found".into()))?;

        let username = update.username.as_deref().unwrap_or(&user.username);
        if is_taken(&tx, "email", &update.email, Some(id))? {
            return Err(RepositoryError::Invalid("Email is already in use".into()));
        }
        if is_taken(&tx, "username", username, Some(id))? {
            return Err(RepositoryError::Invalid("Username is already taken!".into()));
        }

        let profile_picture = update
            .profile_picture
            .as_deref()
            .or(user.profile_picture.as_deref());

        tx.execute(
            "UPDATE users
             SET username = ?1, email = ?2, password_hash = ?3, profile_picture = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                username,
                update.email,
                password_hash.unwrap_or(&user.password_hash),
                profile_picture,
                now_timestamp(),
                id
            ],
        )?;

        let profile = load_profile(&tx, id)?;
        tx.commit()?;
        Ok(profile)
    }
}
