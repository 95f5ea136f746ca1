//! Bot instance creation and command menu setup

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, BotCommandScope, Recipient};

use super::commands;
use crate::core::config::{self, Config};
use crate::core::error::AppResult;
use crate::core::types::Role;

/// Creates a Bot instance with custom or default API URL
pub fn create_bot(config: &Config) -> AppResult<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(config.bot_token(), client);

    let bot = match config.bot_api_url {
        Some(ref bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            bot.set_api_url(url::Url::parse(bot_api_url)?)
        }
        None => bot,
    };

    Ok(bot)
}

/// Telegram menu entries for `role`, straight from the command table.
pub fn bot_commands(role: Role) -> Vec<BotCommand> {
    commands::available_for(role)
        .map(|c| BotCommand::new(c.name, c.description))
        .collect()
}

/// Sets up bot commands in Telegram UI
///
/// Everyone gets the student menu; configured admins additionally get the
/// full list in their private chat.
pub async fn setup_bot_commands(bot: &Bot, admin_ids: &[i64]) -> AppResult<()> {
    bot.set_my_commands(bot_commands(Role::Student)).await?;

    for admin_id in admin_ids {
        bot.set_my_commands(bot_commands(Role::Admin))
            .scope(BotCommandScope::Chat {
                chat_id: Recipient::Id(ChatId(*admin_id)),
            })
            .await?;
    }

    Ok(())
}
