use std::collections::HashMap;

use fluent_templates::fluent_bundle::concurrent::FluentBundle;
use fluent_templates::fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::warn;
use unic_langid::{langid, LanguageIdentifier};

use crate::notification::payload::TemplateArgs;

/// Locale used when a message is missing from the requested one.
const FALLBACK_LOCALE: Locale = Locale::En;

static BUNDLES: Lazy<HashMap<Locale, FluentBundle<FluentResource>>> =
    Lazy::new(|| Locale::iter().map(|locale| (locale, locale.bundle())).collect());

/// Languages the bot ships translations for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    En,
    Ru,
}

impl Locale {
    /// Parses a Telegram language code such as `en`, `ru-RU` or `en_US`.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.split(['-', '_']).next()?.to_lowercase();
        primary.parse().ok()
    }

    pub fn language_id(&self) -> LanguageIdentifier {
        match self {
            Locale::En => langid!("en"),
            Locale::Ru => langid!("ru"),
        }
    }

    fn sources(&self) -> &'static str {
        match self {
            Locale::En => include_str!("../locales/en/notifications.ftl"),
            Locale::Ru => include_str!("../locales/ru/notifications.ftl"),
        }
    }

    fn bundle(&self) -> FluentBundle<FluentResource> {
        let mut bundle = FluentBundle::new_concurrent(vec![self.language_id()]);
        // Telegram shows the Unicode isolation marks Fluent puts around placeables.
        bundle.set_use_isolating(false);

        let resource = match FluentResource::try_new(self.sources().to_string()) {
            Ok(resource) => resource,
            Err((resource, errors)) => {
                warn!(locale = %self, ?errors, "Translations parsed with errors");
                resource
            }
        };
        if let Err(errors) = bundle.add_resource(resource) {
            warn!(locale = %self, ?errors, "Duplicate translation messages");
        }
        bundle
    }
}

/// Renders localized text for a locale.
pub trait Translator: Send + Sync {
    fn render(&self, locale: Locale, key: &str, args: &TemplateArgs) -> String;

    fn button_label(&self, locale: Locale, key: &str) -> String {
        self.render(locale, key, &TemplateArgs::new())
    }
}

/// Fluent translations compiled in from `locales/<lang>/*.ftl`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FluentTranslator;

impl FluentTranslator {
    fn fluent_args(args: &TemplateArgs) -> FluentArgs<'static> {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            let value = match value {
                serde_json::Value::Number(n) => match n.as_f64() {
                    Some(f) => FluentValue::from(f),
                    None => FluentValue::from(n.to_string()),
                },
                serde_json::Value::String(s) => FluentValue::from(s.clone()),
                serde_json::Value::Bool(b) => FluentValue::from(b.to_string()),
                serde_json::Value::Null => FluentValue::from(String::new()),
                other => FluentValue::from(other.to_string()),
            };
            fluent_args.set(name.clone(), value);
        }
        fluent_args
    }

    /// Formats `key` from one locale. Resolver errors such as a missing
    /// variable are logged and the partially formatted text is kept.
    fn format(locale: Locale, key: &str, args: Option<&FluentArgs<'_>>) -> Option<String> {
        let bundle = BUNDLES.get(&locale)?;
        let pattern = bundle.get_message(key)?.value()?;

        let mut errors = Vec::new();
        let text = bundle.format_pattern(pattern, args, &mut errors).into_owned();
        if !errors.is_empty() {
            warn!(%locale, key, ?errors, "Translation rendered with errors");
        }
        Some(text)
    }
}

impl Translator for FluentTranslator {
    fn render(&self, locale: Locale, key: &str, args: &TemplateArgs) -> String {
        let fluent_args = (!args.is_empty()).then(|| Self::fluent_args(args));

        Self::format(locale, key, fluent_args.as_ref())
            .or_else(|| Self::format(FALLBACK_LOCALE, key, fluent_args.as_ref()))
            .unwrap_or_else(|| key.to_string())
            .replace("\\n", "\n")
    }
}
