use axum::http::{header, HeaderMap};
use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::db::new_id;
use crate::repository::RepositoryResult;
use crate::state::DbPool;

/// User resolved from a live session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
}

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user_id: &str, hours: u64) -> RepositoryResult<String> {
    let conn = pool.get()?;

    let token = generate_token();
    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![new_id(), user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Look up the user owning an unexpired session token.
pub fn find_session_user(pool: &DbPool, token: &str) -> RepositoryResult<Option<SessionUser>> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            "SELECT u.id, u.username, u.name, u.email FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| {
                Ok(SessionUser {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    name: row.get(2)?,
                    email: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> RepositoryResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// -- Cookie helpers --

pub fn session_cookie(cookie_name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours.saturating_mul(3600);
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        cookie_name, token, max_age_secs
    )
}

pub fn clear_session_cookie(cookie_name: &str) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        cookie_name
    )
}

pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use axum::http::HeaderValue;

    fn insert_user(pool: &DbPool) {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, name, username, email, password_hash, created_at, updated_at)
             VALUES ('u1', 'Alice', 'alice', 'alice@example.com', 'x', 'now', 'now')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn session_round_trip() {
        let pool = test_pool();
        insert_user(&pool);

        let token = create_session(&pool, "u1", 1).unwrap();
        let user = find_session_user(&pool, &token).unwrap().unwrap();
        assert_eq!(user.username, "alice");

        delete_session(&pool, &token).unwrap();
        assert!(find_session_user(&pool, &token).unwrap().is_none());
    }

    #[test]
    fn expired_session_is_ignored() {
        let pool = test_pool();
        insert_user(&pool);

        let token = create_session(&pool, "u1", 0).unwrap();
        assert!(find_session_user(&pool, &token).unwrap().is_none());
    }

    #[test]
    fn cookie_lookup_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; quill_session=abc123"),
        );
        assert_eq!(get_cookie_value(&headers, "quill_session"), Some("abc123"));
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = clear_session_cookie("quill_session");
        assert!(cookie.starts_with("quill_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(session_cookie("quill_session", "t", 2).contains("Max-Age=7200"));
    }

    #[test]
    fn huge_lifetimes_saturate_max_age() {
        let cookie = session_cookie("quill_session", "t", u64::MAX);
        assert!(cookie.ends_with(&format!("Max-Age={}", u64::MAX)));
    }
}
