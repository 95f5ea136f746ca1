use thiserror::Error;

use super::reference::TicketRef;
use super::state::Action;
use crate::core::retry::Retryable;
use crate::core::types::TicketStatus;

/// Failures of the ticket workflow engine.
///
/// Everything except `StoreUnavailable` is terminal for the request; the
/// messaging layer renders it for the user.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Role or ownership does not allow the action
    #[error("not allowed to {action}")]
    Unauthorized { action: Action },

    /// The state machine has no such edge
    #[error("cannot {action} a ticket in status {from}")]
    InvalidTransition { from: TicketStatus, action: Action },

    /// One-open-ticket-per-category policy refused a new ticket
    #[error("ticket {ticket_number} is already open in this category")]
    DuplicateOpenTicket { ticket_number: String },

    /// Reopen attempted after the retention window elapsed
    #[error("reopen window has expired")]
    WindowExpired,

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    /// Transient infrastructure failure (pool exhausted, database busy)
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Non-transient store failure
    #[error("store error: {0}")]
    Store(String),

    #[error("validation error: {0}")]
    Validation(String),
}

pub type TicketResult<T> = Result<T, TicketError>;

impl TicketError {
    pub fn ticket_not_found(reference: &TicketRef) -> Self {
        TicketError::NotFound {
            entity: "ticket",
            key: reference.to_string(),
        }
    }

    pub fn user_not_found(id: i64) -> Self {
        TicketError::NotFound {
            entity: "user",
            key: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for TicketError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => TicketError::StoreUnavailable(err.to_string()),
            _ => TicketError::Store(err.to_string()),
        }
    }
}

impl From<r2d2::Error> for TicketError {
    /// r2d2 only fails checkouts on timeout, which is transient.
    fn from(err: r2d2::Error) -> Self {
        TicketError::StoreUnavailable(err.to_string())
    }
}

impl Retryable for TicketError {
    fn is_retryable(&self) -> bool {
        matches!(self, TicketError::StoreUnavailable(_))
    }
}
