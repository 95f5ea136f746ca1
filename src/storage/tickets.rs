//! Ticket records and the guarded status updates the engine relies on.

use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Result, Row};

use crate::core::types::{Category, Priority, TicketStatus};

/// How many fresh ticket numbers to try before giving up
const TICKET_NUMBER_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: i64,
    /// Human-readable number, `T<YYYYMM>-<4 digits>`
    pub ticket_number: String,
    pub owner_id: i64,
    pub assigned_to: Option<i64>,
    pub category: Category,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: Priority,
    /// Author hidden from staff
    pub anonymous: bool,
    /// Bumped on every write; updates are guarded by it
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Fixed at creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketOptions {
    pub priority: Priority,
    pub anonymous: bool,
}

/// Field changes applied together with a status transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: TicketStatus,
    pub assigned_to: Option<i64>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Aggregates for the `/stats` view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketStats {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub answered: i64,
    pub closed: i64,
    /// Open tickets nobody has taken yet
    pub unassigned: i64,
    /// Mean hours from creation to close over closed tickets
    pub avg_resolution_hours: Option<f64>,
}

const TICKET_COLUMNS: &str = "id, ticket_number, owner_id, assigned_to, category, subject, status, priority, \
                              is_anonymous, version, created_at, updated_at, closed_at";

fn parse_row(row: &Row<'_>) -> Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        ticket_number: row.get(1)?,
        owner_id: row.get(2)?,
        assigned_to: row.get(3)?,
        category: row.get(4)?,
        subject: row.get(5)?,
        status: row.get(6)?,
        priority: row.get(7)?,
        anonymous: row.get(8)?,
        version: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        closed_at: row.get(12)?,
    })
}

/// `T<YYYYMM>-<4 random digits>`
pub fn generate_ticket_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::rng().random_range(0..10_000);
    format!("T{}-{:04}", now.format("%Y%m"), suffix)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Inserts a new `open` ticket, drawing a fresh number on collision.
pub fn insert_ticket(
    conn: &Connection,
    owner_id: i64,
    category: Category,
    subject: &str,
    options: &TicketOptions,
    now: DateTime<Utc>,
) -> Result<Ticket> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let number = generate_ticket_number(now);
        let inserted = conn.execute(
            "INSERT INTO tickets (ticket_number, owner_id, category, subject, status, priority, is_anonymous,
                                  version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'open', ?5, ?6, 0, ?7, ?7)",
            params![number, owner_id, category, subject, options.priority, options.anonymous, now],
        );
        match inserted {
            Ok(_) => break,
            Err(e) if is_unique_violation(&e) && attempt < TICKET_NUMBER_ATTEMPTS => {
                log::debug!("Ticket number {} already taken, drawing another", number);
            }
            Err(e) => return Err(e),
        }
    }

    let id = conn.last_insert_rowid();
    conn.query_row(
        &format!("SELECT {} FROM tickets WHERE id = ?1", TICKET_COLUMNS),
        params![id],
        parse_row,
    )
}

pub fn get_ticket(conn: &Connection, id: i64) -> Result<Option<Ticket>> {
    conn.query_row(
        &format!("SELECT {} FROM tickets WHERE id = ?1", TICKET_COLUMNS),
        params![id],
        parse_row,
    )
    .optional()
}

/// Lookup by the human-readable number, case-insensitive.
pub fn get_ticket_by_number(conn: &Connection, ticket_number: &str) -> Result<Option<Ticket>> {
    conn.query_row(
        &format!("SELECT {} FROM tickets WHERE ticket_number = ?1", TICKET_COLUMNS),
        params![ticket_number.trim().to_uppercase()],
        parse_row,
    )
    .optional()
}

/// Most recent `open` or `in_progress` ticket of `owner_id` in `category`.
pub fn find_open_ticket(conn: &Connection, owner_id: i64, category: Category) -> Result<Option<Ticket>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM tickets
             WHERE owner_id = ?1 AND category = ?2 AND status IN ('open', 'in_progress')
             ORDER BY id DESC LIMIT 1",
            TICKET_COLUMNS
        ),
        params![owner_id, category],
        parse_row,
    )
    .optional()
}

/// Applies `change` only if the row still has `expected_status` and
/// `expected_version`. Returns `false` when another writer got there first.
pub fn update_status(
    conn: &Connection,
    id: i64,
    expected_status: TicketStatus,
    expected_version: i64,
    change: &StatusChange,
    now: DateTime<Utc>,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE tickets
         SET status = ?1, assigned_to = ?2, closed_at = ?3, updated_at = ?4, version = version + 1
         WHERE id = ?5 AND status = ?6 AND version = ?7",
        params![
            change.status,
            change.assigned_to,
            change.closed_at,
            now,
            id,
            expected_status,
            expected_version
        ],
    )?;
    Ok(updated == 1)
}

/// Bumps `updated_at` and `version` after a message without a status change.
pub fn touch(conn: &Connection, id: i64, expected_version: i64, now: DateTime<Utc>) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE tickets SET updated_at = ?1, version = version + 1 WHERE id = ?2 AND version = ?3",
        params![now, id, expected_version],
    )?;
    Ok(updated == 1)
}

/// Owner's tickets, newest first.
pub fn list_by_owner(conn: &Connection, owner_id: i64, limit: usize) -> Result<Vec<Ticket>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tickets WHERE owner_id = ?1 ORDER BY id DESC LIMIT ?2",
        TICKET_COLUMNS
    ))?;
    let rows = stmt.query_map(params![owner_id, limit_param(limit)], parse_row)?;
    rows.collect()
}

/// Work queue: `open` and `in_progress` tickets, unassigned first, then by
/// priority, then oldest first.
pub fn list_queue(conn: &Connection, limit: usize) -> Result<Vec<Ticket>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tickets
         WHERE status IN ('open', 'in_progress')
         ORDER BY assigned_to IS NOT NULL, priority DESC, id ASC
         LIMIT ?1",
        TICKET_COLUMNS
    ))?;
    let rows = stmt.query_map(params![limit_param(limit)], parse_row)?;
    rows.collect()
}

/// Deletes the ticket and (by cascade) its messages.
pub fn delete_ticket(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM tickets WHERE id = ?1", params![id])?;
    Ok(deleted == 1)
}

pub fn ticket_stats(conn: &Connection) -> Result<TicketStats> {
    let mut stats = TicketStats::default();

    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tickets GROUP BY status")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, TicketStatus>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (status, count) = row?;
        stats.total += count;
        match status {
            TicketStatus::Open => stats.open = count,
            TicketStatus::InProgress => stats.in_progress = count,
            TicketStatus::Answered => stats.answered = count,
            TicketStatus::Closed => stats.closed = count,
        }
    }

    stats.unassigned = conn.query_row(
        "SELECT COUNT(*) FROM tickets WHERE status = 'open' AND assigned_to IS NULL",
        [],
        |row| row.get(0),
    )?;

    stats.avg_resolution_hours = conn.query_row(
        "SELECT AVG((julianday(closed_at) - julianday(created_at)) * 24.0)
         FROM tickets WHERE status = 'closed' AND closed_at IS NOT NULL",
        [],
        |row| row.get(0),
    )?;

    Ok(stats)
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
