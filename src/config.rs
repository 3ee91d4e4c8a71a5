use serde::Deserialize;

use crate::i18n::Locale;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub i18n: I18nConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Telegram id of the single super-dev operator.
    pub dev_id: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "remnashop.db".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct I18nConfig {
    pub default_locale: Locale,
    pub locales: Vec<Locale>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::En,
            locales: vec![Locale::En, Locale::Ru],
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("REMNASHOP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.bot.token.trim().is_empty() {
            anyhow::bail!("bot.token must not be empty");
        }
        if self.i18n.locales.is_empty() {
            anyhow::bail!("i18n.locales must list at least one locale");
        }
        if !self.i18n.locales.contains(&self.i18n.default_locale) {
            anyhow::bail!(
                "i18n.default_locale '{}' is not among i18n.locales",
                self.i18n.default_locale
            );
        }
        Ok(())
    }

    /// Picks the user's Telegram language when it is configured, the default otherwise.
    pub fn resolve_locale(&self, language_code: Option<&str>) -> Locale {
        language_code
            .and_then(Locale::from_code)
            .filter(|locale| self.i18n.locales.contains(locale))
            .unwrap_or(self.i18n.default_locale)
    }
}

#[cfg(test)]
pub(crate) fn test_config(dev_id: i64) -> Config {
    Config {
        bot: BotConfig {
            token: "123:TEST".to_string(),
            dev_id,
        },
        redis: RedisConfig::default(),
        database: DatabaseConfig::default(),
        i18n: I18nConfig::default(),
    }
}
