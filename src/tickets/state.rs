//! Ticket state machine.
//!
//! ```text
//! open ──assign──▶ in_progress ──respond──▶ answered ──close──▶ closed
//!   │                   │                                         │
//!   └──────close (admin)┴─────────────────────────────────────────▶│
//!   ◀───────────────────────────reopen (bounded)──────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::TicketStatus;

/// Everything a user can attempt on a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Submit,
    AddMessage,
    AddNote,
    Assign,
    Respond,
    Close,
    Reopen,
    View,
    Delete,
    SetRole,
    Stats,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Submit => "submit",
            Action::AddMessage => "add_message",
            Action::AddNote => "add_note",
            Action::Assign => "assign",
            Action::Respond => "respond",
            Action::Close => "close",
            Action::Reopen => "reopen",
            Action::View => "view",
            Action::Delete => "delete",
            Action::SetRole => "set_role",
            Action::Stats => "stats",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the status `action` moves a ticket in `from` to, or `None` if the
/// edge does not exist. `by_admin` unlocks the force-close shortcut.
pub fn next_status(from: TicketStatus, action: Action, by_admin: bool) -> Option<TicketStatus> {
    use TicketStatus::*;

    match (from, action) {
        (Open, Action::Assign) => Some(InProgress),
        (InProgress, Action::Respond) => Some(Answered),
        (Answered, Action::Close) => Some(Closed),
        (Open | InProgress, Action::Close) if by_admin => Some(Closed),
        (Closed, Action::Reopen) => Some(Open),
        _ => None,
    }
}
