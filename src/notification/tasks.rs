use std::sync::Arc;

use teloxide::utils::html;
use tokio::sync::Mutex;
use tracing::error;

use crate::config::Config;
use crate::notification::payload::{MediaFile, MediaType, MessagePayload, TemplateArgs};
use crate::notification::service::NotificationService;
use crate::notification::types::SystemNotificationType;
use crate::storage::{Database, UserRole};
use crate::utils;

/// Longest error text quoted in an error report.
pub const MAX_ERROR_TEXT_CHARS: usize = 1021;

/// Telegram's caption limit.
pub const MAX_CAPTION_UTF16: usize = 1024;

/// Details of a failed update, sent to the super-dev.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub update_id: u32,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub error_type: String,
    pub error_message: String,
    pub details: String,
}

/// Broadcasts a system event to every dev in the directory.
pub async fn send_system_notification(
    service: &NotificationService,
    database: &Arc<Mutex<Database>>,
    ntf_type: SystemNotificationType,
    text_key: &str,
    args: TemplateArgs,
) -> Vec<bool> {
    let devs = match database.lock().await.get_by_role(UserRole::Dev) {
        Ok(devs) => devs,
        Err(e) => {
            error!(error = %e, "Failed to load devs, using fallback recipient");
            Vec::new()
        }
    };

    let payload = MessagePayload::builder(text_key)
        .auto_delete_after(None)
        .close_button(true)
        .args(args)
        .build();

    service.system_notify(&devs, &payload, ntf_type).await
}

/// Sends an error report with the full details attached as a text file.
pub async fn send_error_notification(
    service: &NotificationService,
    database: &Arc<Mutex<Database>>,
    config: &Config,
    report: ErrorReport,
) -> bool {
    let dev = match database.lock().await.get_user(config.bot.dev_id) {
        Ok(dev) => dev,
        Err(e) => {
            error!(error = %e, "Failed to load super dev");
            None
        }
    };

    let mut args = TemplateArgs::new();
    args.insert("user".to_string(), report.user_id.is_some().into());
    if let Some(id) = report.user_id {
        args.insert("id".to_string(), id.into());
    }
    if let Some(name) = report.user_name {
        args.insert("name".to_string(), html::escape(&name).into());
    }

    // Telegram counts caption length in UTF-16 units of the parsed text.
    let locale = dev
        .as_ref()
        .map(|dev| dev.language)
        .unwrap_or(config.i18n.default_locale);
    let mut frame = args.clone();
    frame.insert("error".to_string(), String::new().into());
    let frame = service.translator().render(locale, "ntf-event-error", &frame);
    let budget = MAX_CAPTION_UTF16.saturating_sub(utils::visible_utf16_len(&frame));

    let summary = format!("{}: {}", report.error_type, report.error_message);
    let summary = utils::truncate_chars(&summary, MAX_ERROR_TEXT_CHARS);
    let summary = utils::truncate_utf16(&summary, budget);
    args.insert("error".to_string(), html::escape(&summary).into());

    let builder = MessagePayload::builder("ntf-event-error")
        .media(
            MediaFile::memory(report.details.into_bytes(), format!("error_{}.txt", report.update_id)),
            MediaType::Document,
        )
        .auto_delete_after(None)
        .close_button(true)
        .args(args);

    service.notify_super_dev(dev.as_ref(), &builder.build()).await
}
