//! Unidesk - university help-desk Telegram bot
//!
//! Students file requests ("tickets"); teachers, moderators and admins take,
//! answer and close them.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, retry and shared types
//! - `storage`: SQLite pool, migrations and repositories
//! - `tickets`: the role-gated ticket workflow engine
//! - `telegram`: command table, dispatcher and notification delivery

pub mod core;
pub mod storage;
pub mod telegram;
pub mod tickets;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use storage::{create_pool, DbPool};
pub use tickets::{TicketEngine, TicketError};
