//! The ticket workflow engine.
//!
//! Every operation is one unit of work: it checks out a pooled connection on
//! the blocking thread pool, opens a transaction, authorizes the actor,
//! validates the transition and writes. The notification event (at most one)
//! is handed to the [`Notifier`] only after the commit succeeded.

use chrono::{DateTime, Utc};
use rusqlite::{Transaction, TransactionBehavior};
use std::sync::Arc;

use super::authorize;
use super::clock::{Clock, SystemClock};
use super::error::{TicketError, TicketResult};
use super::events::{EventKind, Notifier, Recipient, TicketEvent};
use super::policy::{DuplicatePolicy, TicketPolicy};
use super::reference::TicketRef;
use super::state::{next_status, Action};
use crate::core::config::limits;
use crate::core::types::{Category, Role, TicketStatus};
use crate::storage::db::DbPool;
use crate::storage::messages::{self, MessageKind, TicketMessage};
use crate::storage::tickets::{self, StatusChange, Ticket, TicketOptions, TicketStats};
use crate::storage::users::{self, User, UserProfile};

/// Result of `submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: Ticket,
    /// The body went into an already open ticket instead of a new one
    pub appended: bool,
}

/// A ticket with its conversation, as one viewer may see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketView {
    pub ticket: Ticket,
    /// `None` when the ticket is anonymous and the viewer is staff
    pub owner: Option<User>,
    /// Internal notes are included for staff only
    pub messages: Vec<TicketMessage>,
}

type Outcome<T> = (T, Option<TicketEvent>);

#[derive(Clone)]
pub struct TicketEngine {
    pool: DbPool,
    policy: TicketPolicy,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    admin_ids: Arc<[i64]>,
}

impl TicketEngine {
    pub fn new(pool: DbPool, policy: TicketPolicy, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pool,
            policy,
            notifier,
            clock: Arc::new(SystemClock),
            admin_ids: Arc::from(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Users with these ids are registered (or upgraded) as admins.
    #[must_use]
    pub fn with_admin_ids(mut self, admin_ids: &[i64]) -> Self {
        self.admin_ids = Arc::from(admin_ids);
        self
    }

    pub fn policy(&self) -> &TicketPolicy {
        &self.policy
    }

    /// Runs `op` inside one transaction on the blocking pool, then publishes
    /// its event. Nothing is published if anything fails before commit.
    async fn run<T, F>(&self, behavior: TransactionBehavior, op: F) -> TicketResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>, DateTime<Utc>) -> TicketResult<Outcome<T>> + Send + 'static,
    {
        let pool = self.pool.clone();
        let now = self.clock.now();

        let (value, event) = tokio::task::spawn_blocking(move || -> TicketResult<Outcome<T>> {
            let mut conn = pool.get()?;
            let tx = conn.transaction_with_behavior(behavior)?;
            let outcome = op(&tx, now)?;
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(|e| TicketError::Store(format!("ticket task failed: {}", e)))??;

        if let Some(event) = event {
            log::debug!("Ticket event {}", serde_json::to_string(&event).unwrap_or_default());
            self.notifier.notify(event);
        }
        Ok(value)
    }

    async fn write<T, F>(&self, op: F) -> TicketResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>, DateTime<Utc>) -> TicketResult<Outcome<T>> + Send + 'static,
    {
        self.run(TransactionBehavior::Immediate, op).await
    }

    async fn read<T, F>(&self, op: F) -> TicketResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> TicketResult<T> + Send + 'static,
    {
        self.run(TransactionBehavior::Deferred, move |tx, _| Ok((op(tx)?, None)))
            .await
    }

    /// Records (or refreshes) the sender of an inbound message.
    pub async fn register_user(&self, profile: UserProfile) -> TicketResult<User> {
        let promote = self.admin_ids.contains(&profile.telegram_id);
        self.write(move |tx, now| {
            let user = users::upsert_user(tx, &profile, promote, now)?;
            Ok((user, None))
        })
        .await
    }

    pub async fn get_user(&self, telegram_id: i64) -> TicketResult<User> {
        self.read(move |tx| load_user(tx, telegram_id)).await
    }

    /// Marks a user unreachable (they blocked the bot).
    pub async fn deactivate_user(&self, telegram_id: i64) -> TicketResult<()> {
        self.write(move |tx, _| {
            users::set_active(tx, telegram_id, false)?;
            Ok(((), None))
        })
        .await
    }

    /// Active moderators and admins.
    pub async fn responder_ids(&self) -> TicketResult<Vec<i64>> {
        self.read(|tx| Ok(users::list_responder_ids(tx)?)).await
    }

    /// Opens a ticket, or follows the duplicate policy if the user already
    /// has an open one in `category`.
    pub async fn submit(&self, user_id: i64, category: Category, body: &str) -> TicketResult<Submission> {
        self.submit_with(user_id, category, body, TicketOptions::default()).await
    }

    /// `submit` with a priority and anonymity. The options only apply to a
    /// new ticket; an appended message keeps the existing ticket's.
    pub async fn submit_with(
        &self,
        user_id: i64,
        category: Category,
        body: &str,
        options: TicketOptions,
    ) -> TicketResult<Submission> {
        let body = validate_body(body)?;
        let duplicate = self.policy.duplicate;

        self.write(move |tx, now| {
            let actor = load_user(tx, user_id)?;

            let existing = match duplicate {
                DuplicatePolicy::Allow => None,
                DuplicatePolicy::Append | DuplicatePolicy::Reject => {
                    tickets::find_open_ticket(tx, actor.telegram_id, category)?
                }
            };

            if let Some(ticket) = existing {
                if duplicate == DuplicatePolicy::Reject {
                    return Err(TicketError::DuplicateOpenTicket {
                        ticket_number: ticket.ticket_number,
                    });
                }
                messages::append_message(tx, ticket.id, actor.telegram_id, &body, MessageKind::Owner, now)?;
                guard(tickets::touch(tx, ticket.id, ticket.version, now)?, &ticket, Action::Submit)?;
                let ticket = reload(tx, &ticket)?;
                let event = event_for(&ticket, EventKind::OwnerMessage, staff_recipient(&ticket), &actor, Some(&body));
                return Ok((Submission { ticket, appended: true }, Some(event)));
            }

            let ticket = tickets::insert_ticket(tx, actor.telegram_id, category, &subject_of(&body), &options, now)?;
            messages::append_message(tx, ticket.id, actor.telegram_id, &body, MessageKind::Owner, now)?;
            log::info!(
                "User {} opened ticket {} ({}, priority {}{})",
                actor.telegram_id,
                ticket.ticket_number,
                category,
                ticket.priority,
                if ticket.anonymous { ", anonymous" } else { "" }
            );
            let event = event_for(&ticket, EventKind::Created, Recipient::Responders, &actor, Some(&body));
            Ok((Submission { ticket, appended: false }, Some(event)))
        })
        .await
    }

    /// Owner follow-up on an `open` or `in_progress` ticket.
    pub async fn add_message(&self, ticket: impl Into<TicketRef>, user_id: i64, body: &str) -> TicketResult<Ticket> {
        let reference = ticket.into();
        let body = validate_body(body)?;

        self.write(move |tx, now| {
            let actor = load_user(tx, user_id)?;
            let ticket = load_ticket(tx, &reference)?;
            authorize::require_owner(&actor, &ticket, Action::AddMessage)?;
            if !ticket.status.accepts_owner_messages() {
                return Err(TicketError::InvalidTransition {
                    from: ticket.status,
                    action: Action::AddMessage,
                });
            }

            messages::append_message(tx, ticket.id, actor.telegram_id, &body, MessageKind::Owner, now)?;
            guard(tickets::touch(tx, ticket.id, ticket.version, now)?, &ticket, Action::AddMessage)?;
            let ticket = reload(tx, &ticket)?;
            let event = event_for(&ticket, EventKind::OwnerMessage, staff_recipient(&ticket), &actor, Some(&body));
            Ok((ticket, Some(event)))
        })
        .await
    }

    /// Internal staff note, any status. The owner never sees it and nobody
    /// is notified.
    pub async fn add_note(&self, ticket: impl Into<TicketRef>, responder_id: i64, body: &str) -> TicketResult<Ticket> {
        let reference = ticket.into();
        let body = validate_body(body)?;

        self.write(move |tx, now| {
            let actor = load_user(tx, responder_id)?;
            authorize::require_responder(&actor, Action::AddNote)?;
            let ticket = load_ticket(tx, &reference)?;

            messages::append_message(tx, ticket.id, actor.telegram_id, &body, MessageKind::Internal, now)?;
            guard(tickets::touch(tx, ticket.id, ticket.version, now)?, &ticket, Action::AddNote)?;
            log::debug!("Note added to ticket {} by {}", ticket.ticket_number, actor.telegram_id);
            Ok((reload(tx, &ticket)?, None))
        })
        .await
    }

    /// `open → in_progress`, the responder becomes the assignee.
    pub async fn assign(&self, ticket: impl Into<TicketRef>, responder_id: i64) -> TicketResult<Ticket> {
        let reference = ticket.into();
        self.write(move |tx, now| {
            let actor = load_user(tx, responder_id)?;
            authorize::require_responder(&actor, Action::Assign)?;
            let ticket = load_ticket(tx, &reference)?;
            let to = transition(&ticket, Action::Assign, &actor)?;

            let change = StatusChange {
                status: to,
                assigned_to: Some(actor.telegram_id),
                closed_at: None,
            };
            let ticket = apply(tx, &ticket, Action::Assign, &change, now)?;
            log::info!("Ticket {} assigned to {}", ticket.ticket_number, actor.telegram_id);
            let event = event_for(&ticket, EventKind::Assigned, Recipient::User(ticket.owner_id), &actor, None);
            Ok((ticket, Some(event)))
        })
        .await
    }

    /// Answers the ticket: `in_progress → answered`.
    pub async fn respond(&self, ticket: impl Into<TicketRef>, responder_id: i64, body: &str) -> TicketResult<Ticket> {
        let reference = ticket.into();
        let body = body.to_string();

        self.write(move |tx, now| {
            let actor = load_user(tx, responder_id)?;
            authorize::require_responder(&actor, Action::Respond)?;
            let ticket = load_ticket(tx, &reference)?;
            authorize::require_assignee(&actor, &ticket)?;
            let body = validate_body(&body)?;
            let to = transition(&ticket, Action::Respond, &actor)?;

            messages::append_message(tx, ticket.id, actor.telegram_id, &body, MessageKind::Staff, now)?;
            let change = StatusChange {
                status: to,
                assigned_to: ticket.assigned_to,
                closed_at: None,
            };
            let ticket = apply(tx, &ticket, Action::Respond, &change, now)?;
            let event = event_for(&ticket, EventKind::Answered, Recipient::User(ticket.owner_id), &actor, Some(&body));
            Ok((ticket, Some(event)))
        })
        .await
    }

    /// `answered → closed`, or any open status for admins.
    pub async fn close(&self, ticket: impl Into<TicketRef>, actor_id: i64) -> TicketResult<Ticket> {
        let reference = ticket.into();
        self.write(move |tx, now| {
            let actor = load_user(tx, actor_id)?;
            let ticket = load_ticket(tx, &reference)?;
            authorize::require_closer(&actor, &ticket)?;
            let to = transition(&ticket, Action::Close, &actor)?;

            let forced = ticket.status != TicketStatus::Answered;
            let change = StatusChange {
                status: to,
                assigned_to: ticket.assigned_to,
                closed_at: Some(now),
            };
            let ticket = apply(tx, &ticket, Action::Close, &change, now)?;
            log::info!(
                "Ticket {} closed by {}{}",
                ticket.ticket_number,
                actor.telegram_id,
                if forced { " (forced)" } else { "" }
            );
            let event = event_for(
                &ticket,
                EventKind::Closed { forced },
                counterpart(&ticket, &actor),
                &actor,
                None,
            );
            Ok((ticket, Some(event)))
        })
        .await
    }

    /// `closed → open` for the owner or an admin, within the reopen window.
    pub async fn reopen(&self, ticket: impl Into<TicketRef>, actor_id: i64) -> TicketResult<Ticket> {
        let reference = ticket.into();
        let window = self.policy.reopen_window;
        let clears_assignee = self.policy.reopen_clears_assignee;

        self.write(move |tx, now| {
            let actor = load_user(tx, actor_id)?;
            let ticket = load_ticket(tx, &reference)?;
            authorize::require_reopener(&actor, &ticket)?;
            let to = transition(&ticket, Action::Reopen, &actor)?;

            let closed_at = ticket.closed_at.unwrap_or(ticket.updated_at);
            if now - closed_at > window {
                return Err(TicketError::WindowExpired);
            }

            let change = StatusChange {
                status: to,
                assigned_to: if clears_assignee { None } else { ticket.assigned_to },
                closed_at: None,
            };
            let ticket = apply(tx, &ticket, Action::Reopen, &change, now)?;
            log::info!("Ticket {} reopened by {}", ticket.ticket_number, actor.telegram_id);
            let event = event_for(&ticket, EventKind::Reopened, counterpart(&ticket, &actor), &actor, None);
            Ok((ticket, Some(event)))
        })
        .await
    }

    /// The ticket and its conversation. Staff other than the owner see
    /// internal notes but not the author of an anonymous ticket.
    pub async fn get_ticket(&self, ticket: impl Into<TicketRef>, viewer_id: i64) -> TicketResult<TicketView> {
        let reference = ticket.into();
        self.read(move |tx| {
            let viewer = load_user(tx, viewer_id)?;
            let ticket = load_ticket(tx, &reference)?;
            authorize::require_viewer(&viewer, &ticket)?;

            let is_owner = viewer.telegram_id == ticket.owner_id;
            let owner = if ticket.anonymous && !is_owner {
                None
            } else {
                Some(load_user(tx, ticket.owner_id)?)
            };
            let include_internal = viewer.role.is_responder() && !is_owner;
            let messages = messages::list_messages(tx, ticket.id, include_internal)?;
            Ok(TicketView { ticket, owner, messages })
        })
        .await
    }

    /// The user's own tickets, newest first.
    pub async fn list_own(&self, user_id: i64, limit: usize) -> TicketResult<Vec<Ticket>> {
        self.read(move |tx| {
            let user = load_user(tx, user_id)?;
            Ok(tickets::list_by_owner(tx, user.telegram_id, limit)?)
        })
        .await
    }

    /// Unresolved tickets for responders: unassigned first, then by
    /// priority, oldest first within a priority.
    pub async fn list_queue(&self, responder_id: i64, limit: usize) -> TicketResult<Vec<Ticket>> {
        self.read(move |tx| {
            let user = load_user(tx, responder_id)?;
            authorize::require_responder(&user, Action::View)?;
            Ok(tickets::list_queue(tx, limit)?)
        })
        .await
    }

    pub async fn set_role(&self, admin_id: i64, target_id: i64, role: Role) -> TicketResult<User> {
        let pinned_admin = self.admin_ids.contains(&target_id);

        self.write(move |tx, _| {
            let actor = load_user(tx, admin_id)?;
            authorize::require_admin(&actor, Action::SetRole)?;
            let target = load_user(tx, target_id)?;
            if pinned_admin && role != Role::Admin {
                return Err(TicketError::Validation(format!(
                    "user {} is a configured admin",
                    target.telegram_id
                )));
            }

            users::set_role(tx, target.telegram_id, role)?;
            log::info!(
                "Admin {} changed role of {}: {} -> {}",
                actor.telegram_id,
                target.telegram_id,
                target.role,
                role
            );
            Ok((User { role, ..target }, None))
        })
        .await
    }

    /// Deletes a closed ticket; `force` also removes unresolved ones.
    pub async fn delete(&self, ticket: impl Into<TicketRef>, admin_id: i64, force: bool) -> TicketResult<Ticket> {
        let reference = ticket.into();
        self.write(move |tx, _| {
            let actor = load_user(tx, admin_id)?;
            authorize::require_admin(&actor, Action::Delete)?;
            let ticket = load_ticket(tx, &reference)?;
            if ticket.status != TicketStatus::Closed && !force {
                return Err(TicketError::InvalidTransition {
                    from: ticket.status,
                    action: Action::Delete,
                });
            }

            tickets::delete_ticket(tx, ticket.id)?;
            log::warn!(
                "Ticket {} ({}) deleted by admin {}",
                ticket.ticket_number,
                ticket.status,
                actor.telegram_id
            );
            Ok((ticket, None))
        })
        .await
    }

    pub async fn stats(&self, responder_id: i64) -> TicketResult<TicketStats> {
        self.read(move |tx| {
            let user = load_user(tx, responder_id)?;
            authorize::require_responder(&user, Action::Stats)?;
            Ok(tickets::ticket_stats(tx)?)
        })
        .await
    }
}

fn load_user(tx: &Transaction<'_>, telegram_id: i64) -> TicketResult<User> {
    users::get_user(tx, telegram_id)?.ok_or_else(|| TicketError::user_not_found(telegram_id))
}

fn load_ticket(tx: &Transaction<'_>, reference: &TicketRef) -> TicketResult<Ticket> {
    let found = match reference {
        TicketRef::Id(id) => tickets::get_ticket(tx, *id)?,
        TicketRef::Number(number) => tickets::get_ticket_by_number(tx, number)?,
    };
    found.ok_or_else(|| TicketError::ticket_not_found(reference))
}

/// The row as the current transaction sees it after a write.
fn reload(tx: &Transaction<'_>, ticket: &Ticket) -> TicketResult<Ticket> {
    load_ticket(tx, &TicketRef::Id(ticket.id))
}

fn transition(ticket: &Ticket, action: Action, actor: &User) -> TicketResult<TicketStatus> {
    next_status(ticket.status, action, actor.role.is_admin()).ok_or(TicketError::InvalidTransition {
        from: ticket.status,
        action,
    })
}

/// A guarded write that matched no row lost a race against another writer.
fn guard(updated: bool, ticket: &Ticket, action: Action) -> TicketResult<()> {
    if updated {
        Ok(())
    } else {
        Err(TicketError::InvalidTransition {
            from: ticket.status,
            action,
        })
    }
}

fn apply(
    tx: &Transaction<'_>,
    ticket: &Ticket,
    action: Action,
    change: &StatusChange,
    now: DateTime<Utc>,
) -> TicketResult<Ticket> {
    let updated = tickets::update_status(tx, ticket.id, ticket.status, ticket.version, change, now)?;
    guard(updated, ticket, action)?;
    reload(tx, ticket)
}

/// Assignee if there is one, otherwise the responder pool.
fn staff_recipient(ticket: &Ticket) -> Recipient {
    ticket.assigned_to.map_or(Recipient::Responders, Recipient::User)
}

/// The other side of the conversation from `actor`.
fn counterpart(ticket: &Ticket, actor: &User) -> Recipient {
    if actor.telegram_id == ticket.owner_id {
        staff_recipient(ticket)
    } else {
        Recipient::User(ticket.owner_id)
    }
}

fn event_for(ticket: &Ticket, kind: EventKind, recipient: Recipient, actor: &User, body: Option<&str>) -> TicketEvent {
    TicketEvent {
        ticket_id: ticket.id,
        ticket_number: ticket.ticket_number.clone(),
        kind,
        recipient,
        actor_id: actor.telegram_id,
        preview: body.map(|b| truncate_chars(b, limits::PREVIEW_CHARS)),
    }
}

fn validate_body(body: &str) -> TicketResult<String> {
    let body = body.trim();
    if body.is_empty() {
        return Err(TicketError::Validation("message is empty".to_string()));
    }
    let len = body.chars().count();
    if len > limits::MAX_BODY_CHARS {
        return Err(TicketError::Validation(format!(
            "message is too long ({} > {} characters)",
            len,
            limits::MAX_BODY_CHARS
        )));
    }
    Ok(body.to_string())
}

/// First line of the body, cut to the subject limit.
fn subject_of(body: &str) -> String {
    let first_line = body.lines().next().unwrap_or_default().trim();
    truncate_chars(first_line, limits::MAX_SUBJECT_CHARS)
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_body() {
        assert!(matches!(validate_body("   \n"), Err(TicketError::Validation(_))));
        assert_eq!(validate_body("  hi  ").unwrap(), "hi");
        let long = "я".repeat(limits::MAX_BODY_CHARS + 1);
        assert!(matches!(validate_body(&long), Err(TicketError::Validation(_))));
        let max = "я".repeat(limits::MAX_BODY_CHARS);
        assert!(validate_body(&max).is_ok());
    }

    #[test]
    fn test_subject_is_first_line() {
        assert_eq!(subject_of("Пересдача\nподробности ниже"), "Пересдача");
        let long = "a".repeat(limits::MAX_SUBJECT_CHARS + 10);
        assert_eq!(subject_of(&long).chars().count(), limits::MAX_SUBJECT_CHARS + 1);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_chars("привет", 3), "при…");
        assert_eq!(truncate_chars("hi", 3), "hi");
    }
}
