//! Delivery of ticket events to Telegram users.

use std::future::Future;
use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};
use tokio::sync::mpsc::UnboundedReceiver;

use super::render;
use crate::core::retry::{retry, RetryConfig};
use crate::tickets::{Recipient, TicketEngine, TicketEvent};

/// The user can no longer be reached: stop sending to them.
fn is_unreachable(err: &RequestError) -> bool {
    matches!(
        err,
        RequestError::Api(ApiError::BotBlocked | ApiError::UserDeactivated | ApiError::ChatNotFound)
    )
}

/// Consumes engine events until the channel closes or `shutdown` resolves.
///
/// Each event fans out to its recipients; the actor never hears about their
/// own action. Users who blocked the bot are marked inactive. On shutdown the
/// channel is closed and events already queued are still delivered.
pub async fn run_notification_worker<S>(
    bot: Bot,
    engine: TicketEngine,
    mut events: UnboundedReceiver<TicketEvent>,
    shutdown: S,
) where
    S: Future<Output = ()>,
{
    log::info!("Notification worker started");
    let network = RetryConfig::network();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => deliver(&bot, &engine, &network, event).await,
                None => break,
            },
            () = &mut shutdown => {
                events.close();
                let mut drained = 0;
                while let Some(event) = events.recv().await {
                    deliver(&bot, &engine, &network, event).await;
                    drained += 1;
                }
                log::info!("Notification worker draining done, {} queued events delivered", drained);
                break;
            }
        }
    }

    log::info!("Notification worker stopped");
}

async fn deliver(bot: &Bot, engine: &TicketEngine, network: &RetryConfig, event: TicketEvent) {
    let recipients = match event.recipient {
        Recipient::User(id) => vec![id],
        Recipient::Responders => match engine.responder_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("Cannot load responders for ticket {}: {}", event.ticket_number, e);
                return;
            }
        },
    };

    let text = render::fit_message(render::notification(&event));
    for user_id in recipients.into_iter().filter(|id| *id != event.actor_id) {
        let result = retry(network, || bot.send_message(ChatId(user_id), text.clone()).send()).await;

        match result {
            Ok(_) => log::debug!("Notified {} about ticket {}", user_id, event.ticket_number),
            Err(e) if is_unreachable(&e) => {
                log::warn!("User {} is unreachable ({}), marking inactive", user_id, e);
                if let Err(e) = engine.deactivate_user(user_id).await {
                    log::error!("Failed to deactivate user {}: {}", user_id, e);
                }
            }
            Err(e) => log::error!(
                "Failed to notify {} about ticket {}: {}",
                user_id,
                event.ticket_number,
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_users_are_unreachable() {
        assert!(is_unreachable(&RequestError::Api(ApiError::BotBlocked)));
        assert!(is_unreachable(&RequestError::Api(ApiError::UserDeactivated)));
        assert!(!is_unreachable(&RequestError::Api(ApiError::MessageTextIsEmpty)));
    }
}
