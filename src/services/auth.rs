use crate::models::User;
use crate::services::{format_timestamp, now_timestamp};
use crate::Database;
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeDelta, Utc};
use rand::{rngs::OsRng, RngCore};
use rusqlite::OptionalExtension;
use sha2::{Digest, Sha256};

pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_DISPLAY_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;

const USER_COLUMNS: &str = "id, email, display_name, password_hash, created_at, updated_at";

fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        anyhow::bail!("Email cannot be empty");
    }
    if email.len() > MAX_EMAIL_LENGTH {
        anyhow::bail!("Email must be {} characters or less", MAX_EMAIL_LENGTH);
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => anyhow::bail!("Invalid email format"),
    }
}

fn validate_display_name(name: &str) -> Result<()> {
    if name.len() > MAX_DISPLAY_NAME_LENGTH {
        anyhow::bail!(
            "Display name must be {} characters or less",
            MAX_DISPLAY_NAME_LENGTH
        );
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        anyhow::bail!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        );
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        anyhow::bail!("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        anyhow::bail!("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        anyhow::bail!("Password must contain at least one number");
    }
    Ok(())
}

/// Emails are compared trimmed and case-insensitively everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(password: &str) -> Result<String> {
    validate_password(password)?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dW5rbm93bg$0000000000000000000000000000000000000000000";

/// Unknown accounts and corrupt hashes still pay for one verification so
/// response timing does not reveal which emails exist.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => {
            if let Ok(dummy) = PasswordHash::new(DUMMY_HASH) {
                let _ = Argon2::default().verify_password(password.as_bytes(), &dummy);
            }
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Only the SHA-256 of a session token is stored.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub fn create_user(db: &Database, email: &str, display_name: &str, password: &str) -> Result<i64> {
    let email = normalize_email(email);
    validate_email(&email)?;
    validate_display_name(display_name)?;
    let password_hash = hash_password(password)?;

    if get_user_by_email(db, &email)?.is_some() {
        anyhow::bail!("A user with email '{}' already exists", email);
    }
    let conn = db.get()?;
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO users (email, display_name, password_hash, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
        rusqlite::params![email, display_name.trim(), password_hash, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_password(db: &Database, email: &str, password: &str) -> Result<()> {
    let password_hash = hash_password(password)?;
    let conn = db.get()?;
    let updated = conn.execute(
        "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE email = ?3",
        rusqlite::params![password_hash, now_timestamp(), normalize_email(email)],
    )?;
    if updated == 0 {
        anyhow::bail!("User '{}' not found", email);
    }
    // existing sessions were issued under the old password
    conn.execute(
        "DELETE FROM sessions WHERE user_id = (SELECT id FROM users WHERE email = ?)",
        [normalize_email(email)],
    )?;
    Ok(())
}

pub fn authenticate(db: &Database, email: &str, password: &str) -> Result<Option<User>> {
    let user = get_user_by_email(db, email)?;
    match user {
        Some(u) if verify_password(password, &u.password_hash) => Ok(Some(u)),
        Some(_) => Ok(None),
        None => {
            verify_password(password, "");
            Ok(None)
        }
    }
}

pub fn create_session(db: &Database, user_id: i64, lifetime_days: i64) -> Result<String> {
    let token = generate_session_token();
    let expires_at = format_timestamp(Utc::now() + TimeDelta::days(lifetime_days));
    let conn = db.get()?;
    conn.execute(
        "INSERT INTO sessions (user_id, token_hash, expires_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, hash_token(&token), expires_at],
    )?;
    Ok(token)
}

pub fn validate_session(db: &Database, token: &str) -> Result<Option<User>> {
    let conn = db.get()?;
    let user = conn
        .query_row(
            r#"
            SELECT u.id, u.email, u.display_name, u.password_hash, u.created_at, u.updated_at
            FROM users u
            JOIN sessions s ON s.user_id = u.id
            WHERE s.token_hash = ?1 AND s.expires_at > ?2
            "#,
            rusqlite::params![hash_token(token), now_timestamp()],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

/// Re-validates the session and pushes its expiry out by another lifetime.
/// Returns the user only if the session was still live.
pub fn refresh_session(db: &Database, token: &str, lifetime_days: i64) -> Result<Option<User>> {
    let Some(user) = validate_session(db, token)? else {
        return Ok(None);
    };
    let now = Utc::now();
    let conn = db.get()?;
    conn.execute(
        "UPDATE sessions SET expires_at = ?1, refreshed_at = ?2 WHERE token_hash = ?3",
        rusqlite::params![
            format_timestamp(now + TimeDelta::days(lifetime_days)),
            format_timestamp(now),
            hash_token(token),
        ],
    )?;
    Ok(Some(user))
}

pub fn delete_session(db: &Database, token: &str) -> Result<()> {
    let conn = db.get()?;
    conn.execute("DELETE FROM sessions WHERE token_hash = ?", [hash_token(token)])?;
    Ok(())
}

pub fn cleanup_expired_sessions(db: &Database) -> Result<usize> {
    let conn = db.get()?;
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?",
        [now_timestamp()],
    )?;
    Ok(removed)
}

pub fn has_users(db: &Database) -> Result<bool> {
    let conn = db.get()?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn list_users(db: &Database) -> Result<Vec<User>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users ORDER BY created_at DESC",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn get_user(db: &Database, id: i64) -> Result<Option<User>> {
    let conn = db.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
            [id],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user_by_email(db: &Database, email: &str) -> Result<Option<User>> {
    let conn = db.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
            [normalize_email(email)],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn delete_user(db: &Database, email: &str) -> Result<()> {
    let conn = db.get()?;
    let deleted = conn.execute(
        "DELETE FROM users WHERE email = ?",
        [normalize_email(email)],
    )?;
    if deleted == 0 {
        anyhow::bail!("User '{}' not found", email);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("owner@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("owner@localhost").is_err());
    }

    #[test]
    fn test_token_hash_is_stable_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("abc"));
        assert_ne!(hash, hash_token("abd"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Owner@Example.COM "), "owner@example.com");
    }
}
