//! User records.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::core::types::Role;

/// A user known to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Telegram ID, permanent identity
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Academic group, if the user told us
    pub group_name: Option<String>,
    pub role: Role,
    /// Cleared when the user blocks the bot
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl User {
    /// Name used in ticket cards and notifications.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name, &self.username) {
            (Some(first), Some(last), _) => format!("{} {}", first, last),
            (Some(first), None, _) => first.clone(),
            (None, _, Some(username)) => format!("@{}", username),
            _ => self.telegram_id.to_string(),
        }
    }
}

/// Profile attributes delivered with every inbound message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserProfile {
    pub fn new(telegram_id: i64) -> Self {
        Self {
            telegram_id,
            ..Self::default()
        }
    }
}

const USER_COLUMNS: &str =
    "telegram_id, username, first_name, last_name, group_name, role, is_active, created_at, last_activity";

fn parse_row(row: &Row<'_>) -> Result<User> {
    Ok(User {
        telegram_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        group_name: row.get(4)?,
        role: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
        last_activity: row.get(8)?,
    })
}

/// Creates the user on first contact, refreshes the profile afterwards.
///
/// `promote_admin` upgrades the stored role to admin (configured admin ids).
/// Any contact marks the user active again.
pub fn upsert_user(conn: &Connection, profile: &UserProfile, promote_admin: bool, now: DateTime<Utc>) -> Result<User> {
    let initial_role = if promote_admin { Role::Admin } else { Role::Student };
    conn.execute(
        "INSERT INTO users (telegram_id, username, first_name, last_name, role, is_active, created_at, last_activity)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
         ON CONFLICT(telegram_id) DO UPDATE SET
             username = excluded.username,
             first_name = excluded.first_name,
             last_name = excluded.last_name,
             is_active = 1,
             last_activity = excluded.last_activity,
             role = CASE WHEN ?7 THEN 'admin' ELSE users.role END",
        params![
            profile.telegram_id,
            profile.username,
            profile.first_name,
            profile.last_name,
            initial_role,
            now,
            promote_admin,
        ],
    )?;

    conn.query_row(
        &format!("SELECT {} FROM users WHERE telegram_id = ?1", USER_COLUMNS),
        params![profile.telegram_id],
        parse_row,
    )
}

pub fn get_user(conn: &Connection, telegram_id: i64) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE telegram_id = ?1", USER_COLUMNS),
        params![telegram_id],
        parse_row,
    )
    .optional()
}

/// Returns the number of updated rows (0 if the user is unknown).
pub fn set_role(conn: &Connection, telegram_id: i64, role: Role) -> Result<usize> {
    conn.execute(
        "UPDATE users SET role = ?1 WHERE telegram_id = ?2",
        params![role, telegram_id],
    )
}

pub fn set_active(conn: &Connection, telegram_id: i64, active: bool) -> Result<usize> {
    conn.execute(
        "UPDATE users SET is_active = ?1 WHERE telegram_id = ?2",
        params![active, telegram_id],
    )
}

/// Active moderators and admins: the pool notified about unassigned work.
pub fn list_responder_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT telegram_id FROM users
         WHERE role IN ('moderator', 'admin') AND is_active = 1
         ORDER BY telegram_id",
    )?;
    let ids = stmt.query_map([], |row| row.get(0))?;
    ids.collect()
}
