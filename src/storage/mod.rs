//! SQLite persistence: pool, migrations and repositories

pub mod db;
pub mod messages;
pub mod migrations;
pub mod tickets;
pub mod users;

// Re-exports for convenience
pub use db::{create_pool, DbPool, StoreSettings};
pub use messages::{MessageKind, TicketMessage};
pub use tickets::{Ticket, TicketOptions, TicketStats};
pub use users::{User, UserProfile};
