use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::i18n::Locale;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
pub enum UserRole {
    Dev,
    Admin,
    User,
}

impl UserRole {
    /// Whether the role may change bot-wide settings.
    pub fn is_privileged(&self) -> bool {
        matches!(self, UserRole::Dev | UserRole::Admin)
    }
}

/// A bot user and notification recipient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub telegram_id: i64,
    pub name: String,
    pub role: UserRole,
    pub language: Locale,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(telegram_id: i64, name: impl Into<String>, role: UserRole, language: Locale) -> Self {
        Self {
            telegram_id,
            name: name.into(),
            role,
            language,
            created_at: Utc::now(),
        }
    }
}
