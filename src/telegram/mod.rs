//! Telegram bot integration and handlers

pub mod bot;
pub mod commands;
pub mod handlers;
pub mod notifications;
pub mod render;
pub mod schema;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands};
pub use handlers::{dispatch, ensure_user_exists, HandlerDeps, HandlerError};
pub use notifications::run_notification_worker;
pub use render::{Menu, Reply};
pub use schema::schema;
