//! Role and ownership checks run at the start of every engine operation.

use super::error::{TicketError, TicketResult};
use super::state::Action;
use crate::storage::tickets::Ticket;
use crate::storage::users::User;

fn deny(action: Action) -> TicketError {
    TicketError::Unauthorized { action }
}

/// Teachers, moderators and admins.
pub fn require_responder(user: &User, action: Action) -> TicketResult<()> {
    if user.role.is_responder() {
        Ok(())
    } else {
        Err(deny(action))
    }
}

pub fn require_admin(user: &User, action: Action) -> TicketResult<()> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(deny(action))
    }
}

pub fn require_owner(user: &User, ticket: &Ticket, action: Action) -> TicketResult<()> {
    if ticket.owner_id == user.telegram_id {
        Ok(())
    } else {
        Err(deny(action))
    }
}

/// The owner sees their ticket; responders see every ticket.
pub fn require_viewer(user: &User, ticket: &Ticket) -> TicketResult<()> {
    if ticket.owner_id == user.telegram_id || user.role.is_responder() {
        Ok(())
    } else {
        Err(deny(Action::View))
    }
}

/// Only the assigned responder answers, unless the actor is an admin.
pub fn require_assignee(user: &User, ticket: &Ticket) -> TicketResult<()> {
    require_responder(user, Action::Respond)?;
    if user.role.is_admin() || ticket.assigned_to == Some(user.telegram_id) {
        Ok(())
    } else {
        Err(deny(Action::Respond))
    }
}

/// Owner, assigned responder or admin.
pub fn require_closer(user: &User, ticket: &Ticket) -> TicketResult<()> {
    let is_assignee = ticket.assigned_to == Some(user.telegram_id) && user.role.is_responder();
    if ticket.owner_id == user.telegram_id || is_assignee || user.role.is_admin() {
        Ok(())
    } else {
        Err(deny(Action::Close))
    }
}

/// Owner or admin.
pub fn require_reopener(user: &User, ticket: &Ticket) -> TicketResult<()> {
    if ticket.owner_id == user.telegram_id || user.role.is_admin() {
        Ok(())
    } else {
        Err(deny(Action::Reopen))
    }
}
