use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::notification::CLOSE_NOTIFICATION_CALLBACK;
use crate::telegram::bot::BotState;

/// Handle callback queries (inline buttons)
pub async fn handle_callback(bot: Bot, q: CallbackQuery, _state: Arc<BotState>) -> ResponseResult<()> {
    match q.data.as_deref() {
        Some(CLOSE_NOTIFICATION_CALLBACK) => {
            if let Some(msg) = q.regular_message() {
                debug!("Closing notification {} in chat {}", msg.id.0, msg.chat.id.0);
                if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
                    warn!(error = %e, "Failed to close notification");
                }
            }
        }
        Some(other) => debug!("Ignoring callback '{}'", other),
        None => {}
    }

    bot.answer_callback_query(q.id.clone()).await?;
    Ok(())
}
