//! Dispatcher schema: every private text message goes through `dispatch`.

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, Message, ReplyMarkup};

use super::handlers::{dispatch, ensure_user_exists, HandlerDeps, HandlerError};
use super::render::{self, Menu, Reply};
use crate::storage::users::UserProfile;

/// Creates the dispatcher schema for the bot.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private() && msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { handle_text(&bot, &deps, &msg).await }
        })
}

async fn handle_text(bot: &Bot, deps: &HandlerDeps, msg: &Message) -> Result<(), HandlerError> {
    let (Some(from), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let Ok(telegram_id) = i64::try_from(from.id.0) else {
        log::warn!("Ignoring message from out-of-range user id {}", from.id.0);
        return Ok(());
    };

    let profile = UserProfile {
        telegram_id,
        username: from.username.clone(),
        first_name: Some(from.first_name.clone()),
        last_name: from.last_name.clone(),
    };

    let reply = match ensure_user_exists(deps, profile).await {
        Ok(user) => dispatch(deps, &user, text).await,
        Err(e) => {
            log::error!("Failed to register user {}: {}", telegram_id, e);
            Reply::text(render::error(&e))
        }
    };

    send_reply(bot, msg.chat.id, reply).await?;
    Ok(())
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<Message, teloxide::RequestError> {
    let request = bot.send_message(chat_id, render::fit_message(reply.text));
    match reply.menu {
        Menu::Keep => request.await,
        Menu::Main(role) => request.reply_markup(ReplyMarkup::Keyboard(main_keyboard(role))).await,
    }
}

fn main_keyboard(role: crate::core::types::Role) -> KeyboardMarkup {
    let rows = render::menu_rows(role)
        .into_iter()
        .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>());
    KeyboardMarkup::new(rows).resize_keyboard()
}
