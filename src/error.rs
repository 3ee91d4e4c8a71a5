use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram request error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NotifyError {
    /// Short name of the failure class, used as the title of error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyError::Telegram(_) => "TelegramError",
            NotifyError::Redis(_) => "RedisError",
            NotifyError::Database(_) => "DatabaseError",
            NotifyError::Json(_) => "JsonError",
            NotifyError::Config(_) => "ConfigError",
            NotifyError::NotFound(_) => "NotFound",
            NotifyError::Other(_) => "Error",
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;
