use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio::sync::oneshot;

use unidesk::core::config::{self, network, Config};
use unidesk::core::{init_logger, log_startup_configuration};
use unidesk::storage::create_pool;
use unidesk::telegram::{create_bot, run_notification_worker, schema, setup_bot_commands, HandlerDeps};
use unidesk::tickets::{ChannelNotifier, TicketEngine};

mod cli;

use cli::Cli;

/// Main entry point for the Telegram bot
///
/// # Errors
/// Returns an error (and the process exits non-zero) if configuration is
/// invalid, the log file cannot be opened or the database is unreachable.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables before any configuration is read
    match cli.env_file {
        Some(ref path) => {
            dotenvy::from_filename(path).with_context(|| format!("Failed to load env file {}", path))?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    let config = config::init(Config::from_env().context("Invalid configuration")?)?;
    init_logger(config.log_level, &config.log_file_path)?;

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {}", panic_info);
    }));

    log::info!("Starting unidesk v{}", env!("CARGO_PKG_VERSION"));
    log_startup_configuration(config);

    run_bot(config).await
}

async fn run_bot(config: &'static Config) -> Result<()> {
    let pool = create_pool(&config.database_path, &config.store)
        .with_context(|| format!("Failed to open database {}", config.database_path))?;

    let (notifier, events) = ChannelNotifier::new();
    let engine = TicketEngine::new(pool, config.policy.clone(), Arc::new(notifier)).with_admin_ids(&config.admin_ids);

    let bot = create_bot(config)?;
    if let Err(e) = setup_bot_commands(&bot, &config.admin_ids).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let (stop_worker, stop_signal) = oneshot::channel::<()>();
    let worker = tokio::spawn(run_notification_worker(bot.clone(), engine.clone(), events, async move {
        let _ = stop_signal.await;
    }));

    let handler = schema(HandlerDeps::new(engine));
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    log::info!("Bot is running, press Ctrl+C to stop");
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    // Engine clones keep the event channel open, so the worker has to be told to stop.
    let _ = stop_worker.send(());
    match tokio::time::timeout(network::shutdown_grace(), worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Notification worker failed: {}", e),
        Err(_) => log::warn!(
            "Notification worker did not finish within {:?}, pending notifications dropped",
            network::shutdown_grace()
        ),
    }
    Ok(())
}
