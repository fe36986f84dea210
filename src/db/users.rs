//! User account CRUD and authentication.

use super::{Database, now_ms};
use crate::credentials;
use crate::error::TrackerError;
use crate::types::{User, UserPatch, UserRole};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub(crate) fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        // Stored roles come from UserRole::as_str; anything else in the
        // column is a bug, so fall back to the least-privileged role.
        role: UserRole::from_str(&role).unwrap_or(UserRole::Developer),
        is_active: row.get::<_, i64>("is_active")? != 0,
        created_at: row.get("created_at")?,
    })
}

/// Internal helper to get a user using an existing connection.
pub(crate) fn get_user_internal(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;

    let result = stmt.query_row(params![user_id], parse_user_row);

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn get_by_username_internal(conn: &Connection, username: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare("SELECT * FROM users WHERE username = ?1")?;

    let result = stmt.query_row(params![username], parse_user_row);

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Register a new user. The plaintext password is hashed before storage;
    /// a duplicate username is a validation error.
    pub fn create_user(&self, username: &str, password: &str, role: UserRole) -> Result<User> {
        let now = now_ms();
        let password_hash = credentials::hash_password(password);

        self.with_conn(|conn| {
            if get_by_username_internal(conn, username)?.is_some() {
                return Err(TrackerError::duplicate_username(username).into());
            }

            conn.execute(
                "INSERT INTO users (username, password_hash, role, is_active, created_at)
                 VALUES (?1, ?2, ?3, 1, ?4)",
                params![username, password_hash, role.as_str(), now],
            )?;

            let id = conn.last_insert_rowid();

            Ok(User {
                id,
                username: username.to_string(),
                password_hash,
                role,
                is_active: true,
                created_at: now,
            })
        })
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_internal(conn, user_id))
    }

    /// Get a user by username.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| get_by_username_internal(conn, username))
    }

    /// List users ordered by id, with pagination.
    pub fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM users ORDER BY id LIMIT ?1 OFFSET ?2")?;

            let users = stmt
                .query_map(params![limit, offset], parse_user_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(users)
        })
    }

    /// Apply a sparse patch to a user. A patched password is re-hashed;
    /// changing the username to one already taken is a validation error.
    pub fn update_user(&self, user_id: i64, patch: UserPatch) -> Result<User> {
        self.with_conn(|conn| {
            let user = get_user_internal(conn, user_id)?
                .ok_or_else(|| TrackerError::user_not_found(user_id))?;

            if let Some(ref username) = patch.username {
                if username != &user.username
                    && get_by_username_internal(conn, username)?.is_some()
                {
                    return Err(TrackerError::duplicate_username(username).into());
                }
            }

            let new_username = patch.username.unwrap_or(user.username);
            let new_role = patch.role.unwrap_or(user.role);
            let new_is_active = patch.is_active.unwrap_or(user.is_active);
            let new_hash = match patch.password {
                Some(ref plaintext) => credentials::hash_password(plaintext),
                None => user.password_hash,
            };

            conn.execute(
                "UPDATE users SET username = ?1, password_hash = ?2, role = ?3, is_active = ?4
                 WHERE id = ?5",
                params![
                    new_username,
                    new_hash,
                    new_role.as_str(),
                    new_is_active as i64,
                    user_id
                ],
            )?;

            Ok(User {
                id: user_id,
                username: new_username,
                password_hash: new_hash,
                role: new_role,
                is_active: new_is_active,
                created_at: user.created_at,
            })
        })
    }

    /// Verify credentials and issue a bearer token.
    ///
    /// Unknown usernames, wrong passwords, and inactive accounts all fail
    /// the same way so the caller cannot probe for registered names.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<String> {
        let user = self
            .get_user_by_username(username)?
            .ok_or_else(TrackerError::invalid_credentials)?;

        if !user.is_active || !credentials::verify_password(password, &user.password_hash) {
            return Err(TrackerError::invalid_credentials().into());
        }

        Ok(credentials::issue_token(&user.username))
    }

    /// Change a user's password after verifying the old one.
    pub fn change_password(&self, user_id: i64, old: &str, new: &str) -> Result<()> {
        let user = self
            .get_user(user_id)?
            .ok_or_else(|| TrackerError::user_not_found(user_id))?;

        if !credentials::verify_password(old, &user.password_hash) {
            return Err(TrackerError::invalid_credentials().into());
        }

        let new_hash = credentials::hash_password(new);
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![new_hash, user_id],
            )?;
            Ok(())
        })
    }
}
