use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::Result;
use crate::notification::types::{NotificationScope, NotificationType};
use crate::storage::cache::SettingsRepository;

pub const SYSTEM_SETTINGS_KEY: &str = "notification_settings:system";
pub const USER_SETTINGS_KEY: &str = "notification_settings:user";

fn enabled() -> bool {
    true
}

/// A settings object made of named bool flags.
pub trait NotificationFlags: Serialize + DeserializeOwned + Default + Clone + Send + Sync {
    const KEY: &'static str;

    /// Value of the flag named `key`, if the object declares one.
    fn flag(&self, key: &str) -> Option<bool> {
        serde_json::to_value(self)
            .ok()?
            .get(key)
            .and_then(serde_json::Value::as_bool)
    }

    /// Copy of `self` with flag `key` set; `None` if no such flag exists.
    fn with_flag(&self, key: &str, value: bool) -> Option<Self> {
        let mut raw = serde_json::to_value(self).ok()?;
        let slot = raw.get_mut(key)?;
        *slot = serde_json::Value::Bool(value);
        serde_json::from_value(raw).ok()
    }

    /// All flags, sorted by key.
    fn flags(&self) -> Vec<(String, bool)> {
        let Ok(serde_json::Value::Object(map)) = serde_json::to_value(self) else {
            return Vec::new();
        };
        map.into_iter()
            .filter_map(|(k, v)| v.as_bool().map(|b| (k, b)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNotificationSettings {
    #[serde(default = "enabled")]
    pub bot_lifetime: bool,
    #[serde(default = "enabled")]
    pub user_registered: bool,
    #[serde(default = "enabled")]
    pub subscription: bool,
    #[serde(default = "enabled")]
    pub promocode_activated: bool,
    #[serde(default = "enabled")]
    pub critical_error: bool,
    #[serde(default = "enabled")]
    pub system_update: bool,
}

impl Default for SystemNotificationSettings {
    fn default() -> Self {
        Self {
            bot_lifetime: true,
            user_registered: true,
            subscription: true,
            promocode_activated: true,
            critical_error: true,
            system_update: true,
        }
    }
}

impl NotificationFlags for SystemNotificationSettings {
    const KEY: &'static str = SYSTEM_SETTINGS_KEY;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserNotificationSettings {
    #[serde(default = "enabled")]
    pub subscription_3_days_left: bool,
    #[serde(default = "enabled")]
    pub subscription_24_hours_left: bool,
    #[serde(default = "enabled")]
    pub subscription_ended: bool,
    #[serde(default = "enabled")]
    pub available_after_maintenance: bool,
}

impl Default for UserNotificationSettings {
    fn default() -> Self {
        Self {
            subscription_3_days_left: true,
            subscription_24_hours_left: true,
            subscription_ended: true,
            available_after_maintenance: true,
        }
    }
}

impl NotificationFlags for UserNotificationSettings {
    const KEY: &'static str = USER_SETTINGS_KEY;
}

/// Persists both settings objects in the cache.
#[derive(Clone)]
pub struct NotificationSettingsStore {
    repository: SettingsRepository,
}

impl NotificationSettingsStore {
    pub fn new(repository: SettingsRepository) -> Self {
        Self { repository }
    }

    pub async fn load<S: NotificationFlags>(&self) -> Result<S> {
        self.repository.get(S::KEY, S::default()).await
    }

    pub async fn save<S: NotificationFlags>(&self, settings: &S) -> Result<()> {
        self.repository.set(S::KEY, settings).await
    }

    pub async fn get_system_settings(&self) -> Result<SystemNotificationSettings> {
        self.load().await
    }

    pub async fn set_system_settings(&self, settings: &SystemNotificationSettings) -> Result<()> {
        self.save(settings).await
    }

    pub async fn get_user_settings(&self) -> Result<UserNotificationSettings> {
        self.load().await
    }

    pub async fn set_user_settings(&self, settings: &UserNotificationSettings) -> Result<()> {
        self.save(settings).await
    }

    /// Current flag for `ntf_type`; `false` when its scope declares no such flag.
    pub async fn is_enabled(&self, ntf_type: NotificationType) -> Result<bool> {
        let flag = match ntf_type.scope() {
            NotificationScope::System => self.get_system_settings().await?.flag(ntf_type.key()),
            NotificationScope::User => self.get_user_settings().await?.flag(ntf_type.key()),
        };
        Ok(flag.unwrap_or(false))
    }

    /// Flips the flag for `ntf_type` and writes the whole object back.
    /// Returns the new value, or `None` if the flag is not declared.
    pub async fn toggle(&self, ntf_type: NotificationType) -> Result<Option<bool>> {
        match ntf_type.scope() {
            NotificationScope::System => {
                let settings = self.get_system_settings().await?;
                self.toggle_in(settings, ntf_type.key()).await
            }
            NotificationScope::User => {
                let settings = self.get_user_settings().await?;
                self.toggle_in(settings, ntf_type.key()).await
            }
        }
    }

    async fn toggle_in<S: NotificationFlags>(&self, settings: S, key: &str) -> Result<Option<bool>> {
        let Some(current) = settings.flag(key) else {
            return Ok(None);
        };
        let Some(updated) = settings.with_flag(key, !current) else {
            return Ok(None);
        };
        self.save(&updated).await?;
        Ok(Some(!current))
    }
}
