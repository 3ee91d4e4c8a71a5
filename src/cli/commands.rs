use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "remnashop")]
#[command(about = "Notification dispatch bot for remnashop")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (extension optional)
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Telegram bot
    Run,

    /// Initialize database and check configuration
    Init,

    /// Inspect or change notification settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Send a localized message to a registered user
    Notify {
        /// Telegram id of the recipient
        telegram_id: i64,

        /// Translation key of the message
        text_key: String,
    },

    /// List registered devs
    Devs,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print every notification flag
    Show,

    /// Flip one notification flag
    Toggle {
        /// Notification type key, e.g. critical_error
        key: String,
    },
}
