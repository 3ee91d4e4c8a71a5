use teloxide::utils::html;

use crate::i18n::{Locale, Translator};
use crate::notification::settings::{
    NotificationFlags, SystemNotificationSettings, UserNotificationSettings,
};
use crate::notification::TemplateArgs;

/// One `✅ key` / `❌ key` line per flag
fn format_flags(flags: &[(String, bool)]) -> String {
    flags
        .iter()
        .map(|(key, enabled)| {
            let mark = if *enabled { "✅" } else { "❌" };
            format!("{} <code>{}</code>", mark, html::escape(key))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings overview sent in reply to `/notifications`
pub fn format_settings_tg(
    translator: &dyn Translator,
    locale: Locale,
    system: &SystemNotificationSettings,
    user: &UserNotificationSettings,
) -> String {
    let args = TemplateArgs::new();
    format!(
        "<b>{}</b>\n\n<b>{}</b>\n{}\n\n<b>{}</b>\n{}",
        translator.render(locale, "msg-notifications-header", &args),
        translator.render(locale, "msg-notifications-system", &args),
        format_flags(&system.flags()),
        translator.render(locale, "msg-notifications-user", &args),
        format_flags(&user.flags()),
    )
}
