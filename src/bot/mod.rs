//! The chat bot: long polling and per-message request handling.

pub mod handler;
pub mod messages;
pub mod thumbnail;

pub use handler::{handle_message, process_youtube_url, BotContext, ProcessError};

use std::time::Duration;

use crate::telegram::TelegramClient;

/// Pause before polling again after a failed getUpdates call.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll Telegram for updates until Ctrl-C, handling each message on its own
/// task.
pub async fn run_polling(
    client: TelegramClient,
    ctx: BotContext,
    poll_timeout: Duration,
) -> anyhow::Result<()> {
    let mut offset: Option<i64> = None;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let updates = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Received Ctrl-C, stopping bot");
                break;
            }
            result = client.get_updates(offset, poll_timeout) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed: {:#}; retrying in {:?}", e, RETRY_DELAY);
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };

            let ctx = ctx.clone();
            tokio::spawn(async move {
                let chat_id = message.chat.id;
                if let Err(e) = handle_message(&ctx, message).await {
                    tracing::error!("failed to handle message in chat {}: {:#}", chat_id, e);
                }
            });
        }
    }

    Ok(())
}
