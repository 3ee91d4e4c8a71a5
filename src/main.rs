mod cli;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands, SettingsCommand};
use colored::*;
use teloxide::Bot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use remnashop::notification::{
    MessagePayload, NotificationFlags, NotificationSettingsStore, NotificationType,
};
use remnashop::storage::{Database, RedisStore, SettingsRepository, UserRole};
use remnashop::{error, telegram, utils, Config, NotifyError};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("remnashop=debug,info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => {
            info!("Starting Telegram bot interface...");
            telegram::run_telegram_bot(config).await
        }

        Commands::Init => {
            info!("Initializing...");
            initialize(&config).await
        }

        Commands::Settings { action } => match action {
            SettingsCommand::Show => show_settings(&config).await,
            SettingsCommand::Toggle { key } => toggle_setting(&config, &key).await,
        },

        Commands::Notify { telegram_id, text_key } => {
            info!("Sending '{}' to {}", text_key, telegram_id);
            notify(config, telegram_id, &text_key).await
        }

        Commands::Devs => list_devs(&config),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn settings_store(config: &Config) -> error::Result<NotificationSettingsStore> {
    let store = RedisStore::connect(&config.redis.url).await?;
    Ok(NotificationSettingsStore::new(SettingsRepository::new(Arc::new(store))))
}

async fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing remnashop...".green());
    let db = Database::new(&config.database.path)?;
    println!("{}", "✓ Database initialized".green());

    let settings = settings_store(config).await?;
    settings.set_system_settings(&settings.get_system_settings().await?).await?;
    settings.set_user_settings(&settings.get_user_settings().await?).await?;
    println!("{}", "✓ Notification settings stored".green());
    println!("{}", "✓ Configuration loaded".green());

    println!("\n{}", "Configuration:".cyan());
    println!("  Database:       {}", config.database.path);
    println!("  Redis:          {}", config.redis.url);
    println!("  Super dev:      {}", config.bot.dev_id);
    println!("  Locale:         {}", config.i18n.default_locale);
    println!("  Users:          {}", db.count_users()?);

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to start the bot", "remnashop run".yellow());
    println!("  {} to view notification settings", "remnashop settings show".yellow());
    Ok(())
}

async fn show_settings(config: &Config) -> error::Result<()> {
    let settings = settings_store(config).await?;
    let system = settings.get_system_settings().await?;
    let user = settings.get_user_settings().await?;

    for (title, flags) in [("System notifications", system.flags()), ("User notifications", user.flags())] {
        println!("\n{}", format!("=== {} ===", title).cyan().bold());
        for (key, enabled) in flags {
            println!("  {:<30} {}", key, utils::format_flag(enabled));
        }
    }
    Ok(())
}

async fn toggle_setting(config: &Config, key: &str) -> error::Result<()> {
    let ntf_type = NotificationType::from_key(key)
        .ok_or_else(|| NotifyError::NotFound(format!("notification type '{}'", key)))?;

    let settings = settings_store(config).await?;
    match settings.toggle(ntf_type).await? {
        Some(enabled) => {
            println!("{} {}", ntf_type.to_string().bold(), utils::format_flag(enabled));
            Ok(())
        }
        None => Err(NotifyError::NotFound(format!("notification flag '{}'", key))),
    }
}

async fn notify(config: Config, telegram_id: i64, text_key: &str) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let user = db
        .get_user(telegram_id)?
        .ok_or_else(|| NotifyError::NotFound(format!("user {}", telegram_id)))?;

    let bot = Bot::new(config.bot.token.clone());
    let service = telegram::build_service(Arc::new(config), bot).await?;

    // The process exits right after sending, so no deletion timer is armed.
    let payload = MessagePayload::builder(text_key)
        .auto_delete_after(None)
        .close_button(true)
        .arg("name", teloxide::utils::html::escape(&user.name))
        .build();

    if service.notify_user(Some(&user), &payload, None).await {
        println!("{}", format!("✓ Sent '{}' to {}", text_key, user.name).green());
        Ok(())
    } else {
        Err(NotifyError::Other(anyhow::anyhow!("delivery to {} failed", telegram_id)))
    }
}

fn list_devs(config: &Config) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let devs = db.get_by_role(UserRole::Dev)?;

    if devs.is_empty() {
        println!("{}", "No devs registered".yellow());
        return Ok(());
    }

    let widths = [14, 24, 8, 24];
    utils::print_table_border(76);
    utils::print_table_row(&["Telegram ID", "Name", "Locale", "Registered"], &widths);
    utils::print_table_border(76);
    for dev in &devs {
        utils::print_table_row(
            &[
                &dev.telegram_id.to_string(),
                &dev.name,
                dev.language.as_ref(),
                &utils::format_timestamp(&dev.created_at),
            ],
            &widths,
        );
    }
    utils::print_table_border(76);
    Ok(())
}
