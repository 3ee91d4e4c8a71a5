use std::sync::Arc;

use teloxide::types::ParseMode;
use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::{error, info};

use crate::error::Result;
use crate::i18n::Locale;
use crate::notification::tasks::{send_error_notification, send_system_notification, ErrorReport};
use crate::notification::{MessagePayload, NotificationType, SystemNotificationType, TemplateArgs};
use crate::storage::{User, UserRole};
use crate::telegram::bot::{BotState, Command};
use crate::telegram::formatters::format_settings_tg;

pub async fn answer(
    bot: Bot,
    update: Update,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    if let Err(e) = handle_command(&bot, &msg, cmd, &state).await {
        error!(chat_id = msg.chat.id.0, error = %e, "Command handler failed");

        let from = msg.from.as_ref();
        let report = ErrorReport {
            update_id: update.id.0,
            user_id: from.map(|u| u.id.0 as i64),
            user_name: from.map(|u| u.full_name()),
            error_type: e.kind().to_string(),
            error_message: e.to_string(),
            details: format!("{:#?}", e),
        };
        send_error_notification(&state.service, &state.database, &state.config, report).await;
    }

    Ok(())
}

async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, state: &BotState) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let telegram_id = from.id.0 as i64;

    match cmd {
        Command::Start => {
            let locale = state.config.resolve_locale(from.language_code.as_deref());
            let db = state.database.lock().await;
            let role = if telegram_id == state.config.bot.dev_id {
                UserRole::Dev
            } else {
                db.get_user(telegram_id)?
                    .map(|known| known.role)
                    .unwrap_or(UserRole::User)
            };
            let user = User::new(telegram_id, from.full_name(), role, locale);

            let is_new = db.upsert_user(&user)?;
            drop(db);
            if is_new {
                info!("Registered new user {}", telegram_id);
                let mut args = TemplateArgs::new();
                args.insert("name".to_string(), teloxide::utils::html::escape(&user.name).into());
                args.insert("id".to_string(), telegram_id.into());
                send_system_notification(
                    &state.service,
                    &state.database,
                    SystemNotificationType::UserRegistered,
                    "ntf-event-new-user",
                    args,
                )
                .await;
            }

            let payload = MessagePayload::builder("ntf-welcome")
                .arg("name", teloxide::utils::html::escape(&user.name))
                .build();
            state.service.notify_user(Some(&user), &payload, None).await;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Notifications => {
            let Some(locale) = privileged_locale(bot, msg, state, telegram_id).await? else {
                return Ok(());
            };

            let settings = state.service.settings();
            let text = match (settings.get_system_settings().await, settings.get_user_settings().await) {
                (Ok(system), Ok(user)) => {
                    format_settings_tg(state.service.translator(), locale, &system, &user)
                }
                (Err(e), _) | (_, Err(e)) => {
                    error!(error = %e, "Failed to load notification settings");
                    render(state, locale, "msg-settings-unavailable", TemplateArgs::new())
                }
            };
            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Toggle(key) => {
            let Some(locale) = privileged_locale(bot, msg, state, telegram_id).await? else {
                return Ok(());
            };

            let key = key.trim();
            if key.is_empty() {
                let text = render(state, locale, "msg-notification-toggle-usage", TemplateArgs::new());
                bot.send_message(msg.chat.id, text).await?;
                return Ok(());
            }

            let mut args = TemplateArgs::new();
            args.insert("type".to_string(), key.into());

            let text = match NotificationType::from_key(key) {
                None => render(state, locale, "msg-notification-unknown", args),
                Some(ntf_type) => match state.service.settings().toggle(ntf_type).await? {
                    Some(enabled) => {
                        info!("Notification '{}' toggled to {} by {}", ntf_type, enabled, telegram_id);
                        args.insert("enabled".to_string(), enabled.into());
                        render(state, locale, "msg-notification-toggled", args)
                    }
                    None => render(state, locale, "msg-notification-unknown", args),
                },
            };
            bot.send_message(msg.chat.id, text).await?;
        }
    };

    Ok(())
}

/// Locale of the sender if they may manage settings; replies with a refusal otherwise.
async fn privileged_locale(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    telegram_id: i64,
) -> Result<Option<Locale>> {
    let user = state.database.lock().await.get_user(telegram_id)?;

    match user {
        Some(user) if user.role.is_privileged() => Ok(Some(user.language)),
        user => {
            let locale = user
                .map(|u| u.language)
                .unwrap_or(state.config.i18n.default_locale);
            let text = render(state, locale, "msg-access-denied", TemplateArgs::new());
            bot.send_message(msg.chat.id, text).await?;
            Ok(None)
        }
    }
}

fn render(state: &BotState, locale: Locale, key: &str, args: TemplateArgs) -> String {
    state.service.translator().render(locale, key, &args)
}
