pub mod models;

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_initial",
        include_str!("../../migrations/001_initial.sql"),
    ),
    ("002_blog", include_str!("../../migrations/002_blog.sql")),
    (
        "003_comments",
        include_str!("../../migrations/003_comments.sql"),
    ),
    (
        "004_title_folded",
        include_str!("../../migrations/004_title_folded.sql"),
    ),
];

const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
";

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    // foreign_keys is per-connection, so every pooled connection gets the pragmas
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));
    let pool = Pool::builder().max_size(8).build(manager)?;

    Ok(pool)
}

fn applied_migrations(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM schema_version")?;
    let names = stmt.query_map([], |row| row.get(0))?;
    names.collect()
}

/// Apply pending migrations in order, each in its own transaction.
pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let mut conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let applied = applied_migrations(&conn)?;
    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(name, _)| !applied.contains(*name))
        .collect();

    for (name, sql) in &pending {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)
            .with_context(|| format!("applying migration {}", name))?;
        tx.execute("INSERT INTO schema_version (name) VALUES (?1)", [name])?;
        tx.commit()?;
        tracing::info!(migration = %name, "Applied migration");
    }

    tracing::info!(
        applied = pending.len(),
        total = MIGRATIONS.len(),
        "Database schema up to date"
    );
    Ok(())
}

/// Current time as a fixed-width RFC 3339 string, so stored timestamps sort as text.
pub fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Fresh time-ordered identifier for any stored record.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

#[cfg(test)]
pub(crate) fn test_pool() -> DbPool {
    // A single connection, since every in-memory connection is its own database
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    run_migrations(&pool).unwrap();
    pool
}
