//! Append-only ticket conversation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: i64,
    pub sender_id: i64,
    pub body: String,
    /// Written by a responder rather than the owner
    pub from_staff: bool,
    /// Staff-only note
    pub internal: bool,
    pub created_at: DateTime<Utc>,
}

/// Who wrote a message and who may read it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Owner,
    /// Visible to the owner
    Staff,
    /// Visible to responders only
    Internal,
}

impl MessageKind {
    fn columns(self) -> (bool, bool) {
        match self {
            MessageKind::Owner => (false, false),
            MessageKind::Staff => (true, false),
            MessageKind::Internal => (true, true),
        }
    }
}

pub fn append_message(
    conn: &Connection,
    ticket_id: i64,
    sender_id: i64,
    body: &str,
    kind: MessageKind,
    now: DateTime<Utc>,
) -> Result<TicketMessage> {
    let (from_staff, internal) = kind.columns();
    conn.execute(
        "INSERT INTO ticket_messages (ticket_id, sender_id, body, from_staff, is_internal, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![ticket_id, sender_id, body, from_staff, internal, now],
    )?;
    Ok(TicketMessage {
        id: conn.last_insert_rowid(),
        ticket_id,
        sender_id,
        body: body.to_string(),
        from_staff,
        internal,
        created_at: now,
    })
}

/// Messages in insertion order. Internal notes only with `include_internal`.
pub fn list_messages(conn: &Connection, ticket_id: i64, include_internal: bool) -> Result<Vec<TicketMessage>> {
    let mut stmt = conn.prepare(
        "SELECT id, ticket_id, sender_id, body, from_staff, is_internal, created_at
         FROM ticket_messages
         WHERE ticket_id = ?1 AND (?2 OR is_internal = 0)
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![ticket_id, include_internal], |row| {
        Ok(TicketMessage {
            id: row.get(0)?,
            ticket_id: row.get(1)?,
            sender_id: row.get(2)?,
            body: row.get(3)?,
            from_staff: row.get(4)?,
            internal: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;
    rows.collect()
}
