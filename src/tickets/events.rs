//! Notification events produced by committed ticket transitions.

use serde::Serialize;
use tokio::sync::mpsc;

/// What happened to the ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EventKind {
    /// New ticket waiting in the queue
    Created,
    /// Owner added text to an open ticket
    OwnerMessage,
    Assigned,
    Answered,
    /// `forced` when an admin closed a ticket that was never answered
    Closed { forced: bool },
    Reopened,
}

/// Who should hear about it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    User(i64),
    /// Every active moderator and admin
    Responders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketEvent {
    pub ticket_id: i64,
    pub ticket_number: String,
    pub kind: EventKind,
    pub recipient: Recipient,
    /// User whose action produced the event
    pub actor_id: i64,
    /// Message text attached to the transition, if any
    pub preview: Option<String>,
}

/// Receives events after the transaction that produced them has committed.
///
/// Must not block: delivery happens elsewhere.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: TicketEvent);
}

/// Forwards events to the notification worker over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<TicketEvent>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TicketEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: TicketEvent) {
        if let Err(e) = self.tx.send(event) {
            log::warn!(
                "Notification worker is gone, dropping {:?} for ticket {}",
                e.0.kind,
                e.0.ticket_number
            );
        }
    }
}
