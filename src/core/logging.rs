//! Logging initialization and startup diagnostics

use anyhow::Result;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;

use crate::core::config::Config;

/// Initialize logger for both console and file output
///
/// The file is opened in append mode so restarts keep earlier history.
/// Chatty dependencies are held at `warn`.
pub fn init_logger(level: LevelFilter, log_file_path: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", log_file_path, e))?;

    let config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("refinery_core")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup.
///
/// Never prints the bot token.
pub fn log_startup_configuration(config: &Config) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🎫 Help desk configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Database: {}", config.database_path);
    log::info!(
        "Pool: {} connections, checkout timeout {:?}, busy timeout {:?}",
        config.store.pool_size,
        config.store.connection_timeout,
        config.store.busy_timeout
    );

    if config.admin_ids.is_empty() {
        log::warn!("⚠️  ADMIN_IDS: not set, nobody can change roles until an admin is configured");
    } else {
        log::info!("✅ ADMIN_IDS: {} configured", config.admin_ids.len());
    }

    match config.bot_api_url {
        Some(ref url) => log::info!("Bot API: {}", url),
        None => log::info!("Bot API: default"),
    }

    log::info!(
        "Reopen window: {}h, duplicate tickets: {}, reopen clears assignee: {}",
        config.policy.reopen_window.num_hours(),
        config.policy.duplicate,
        config.policy.reopen_clears_assignee
    );
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
