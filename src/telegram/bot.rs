use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::Config;
use crate::i18n::FluentTranslator;
use crate::notification::settings::NotificationSettingsStore;
use crate::notification::tasks::send_system_notification;
use crate::notification::{NotificationService, SystemNotificationType, TemplateArgs};
use crate::storage::{Database, RedisStore, SettingsRepository};
use crate::telegram::transport::TeloxideTransport;

/// State shared across all bot handlers
pub struct BotState {
    pub config: Arc<Config>,
    pub service: Arc<NotificationService>,
    pub database: Arc<Mutex<Database>>,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "Start interaction with the bot")]
    Start,
    #[command(description = "Show help message")]
    Help,
    #[command(description = "Show notification settings")]
    Notifications,
    #[command(description = "Toggle a notification type, e.g. /toggle critical_error")]
    Toggle(String),
}

/// Wires the notification service to real Telegram and Redis clients.
pub async fn build_service(config: Arc<Config>, bot: Bot) -> crate::error::Result<NotificationService> {
    let store = RedisStore::connect(&config.redis.url).await?;
    let settings = NotificationSettingsStore::new(SettingsRepository::new(Arc::new(store)));

    Ok(NotificationService::new(
        config,
        Arc::new(TeloxideTransport::new(bot)),
        Arc::new(FluentTranslator),
        settings,
    ))
}

pub async fn run_telegram_bot(config: Config) -> crate::error::Result<()> {
    info!("Starting Telegram bot...");

    let config = Arc::new(config);
    let bot = Bot::new(config.bot.token.clone());
    let service = Arc::new(build_service(Arc::clone(&config), bot.clone()).await?);
    let database = Arc::new(Mutex::new(Database::new(&config.database.path)?));

    let state = Arc::new(BotState {
        config,
        service,
        database,
    });

    send_system_notification(
        &state.service,
        &state.database,
        SystemNotificationType::BotLifetime,
        "ntf-event-bot-startup",
        TemplateArgs::new(),
    )
    .await;

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(crate::telegram::commands::answer),
        )
        .branch(Update::filter_callback_query().endpoint(crate::telegram::callbacks::handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![Arc::clone(&state)])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram bot stopped");
    let results = send_system_notification(
        &state.service,
        &state.database,
        SystemNotificationType::BotLifetime,
        "ntf-event-bot-shutdown",
        TemplateArgs::new(),
    )
    .await;
    if results.iter().any(|sent| !sent) {
        error!("Shutdown notification was not delivered to every dev");
    }

    Ok(())
}
