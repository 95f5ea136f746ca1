//! Ticket workflow: role-gated state machine over persisted tickets

pub mod authorize;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod policy;
pub mod reference;
pub mod state;

pub use crate::storage::tickets::TicketOptions;
pub use clock::{Clock, SystemClock};
pub use engine::{Submission, TicketEngine, TicketView};
pub use error::{TicketError, TicketResult};
pub use events::{ChannelNotifier, EventKind, Notifier, Recipient, TicketEvent};
pub use policy::{DuplicatePolicy, TicketPolicy};
pub use reference::TicketRef;
pub use state::Action;
