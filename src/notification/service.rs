use std::sync::Arc;

use futures::future::join_all;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ReplyMarkup};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::i18n::{Locale, Translator};
use crate::notification::gate::DispatchGate;
use crate::notification::payload::MessagePayload;
use crate::notification::scheduler::DeletionScheduler;
use crate::notification::settings::NotificationSettingsStore;
use crate::notification::types::{NotificationType, SystemNotificationType, UserNotificationType};
use crate::storage::models::{User, UserRole};
use crate::telegram::transport::{SentMessage, Transport};

/// Callback data of the button that dismisses a notification.
pub const CLOSE_NOTIFICATION_CALLBACK: &str = "notification:close";

const CLOSE_BUTTON_KEY: &str = "btn-close-notification";

/// Renders, gates and delivers notifications.
pub struct NotificationService {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    translator: Arc<dyn Translator>,
    gate: DispatchGate,
    scheduler: DeletionScheduler,
}

impl NotificationService {
    pub fn new(
        config: Arc<Config>,
        transport: Arc<dyn Transport>,
        translator: Arc<dyn Translator>,
        settings: NotificationSettingsStore,
    ) -> Self {
        let scheduler = DeletionScheduler::new(Arc::clone(&transport));
        Self {
            config,
            transport,
            translator,
            gate: DispatchGate::new(settings),
            scheduler,
        }
    }

    pub fn settings(&self) -> &NotificationSettingsStore {
        self.gate.settings()
    }

    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    pub async fn notify_user(
        &self,
        user: Option<&User>,
        payload: &MessagePayload,
        ntf_type: Option<UserNotificationType>,
    ) -> bool {
        let Some(user) = user else {
            warn!("Skipping user notification: user object is empty");
            return false;
        };

        if !self.gate.is_enabled(ntf_type.map(NotificationType::User)).await {
            debug!(
                "Skipping user notification for '{}': notification type is disabled in settings",
                user.telegram_id
            );
            return false;
        }

        debug!(
            "Attempting to send user notification '{}' to '{}'",
            payload.text_key(),
            user.telegram_id
        );
        self.send(user, payload).await.is_some()
    }

    /// Sends to every dev concurrently; results follow the order of `devs`.
    pub async fn system_notify(
        &self,
        devs: &[User],
        payload: &MessagePayload,
        ntf_type: SystemNotificationType,
    ) -> Vec<bool> {
        let fallback;
        let devs = if devs.is_empty() {
            fallback = [self.temp_dev()];
            &fallback[..]
        } else {
            devs
        };

        if !self.gate.is_enabled(Some(ntf_type.into())).await {
            debug!("Skipping system notification: notification type is disabled in settings");
            return Vec::new();
        }

        debug!(
            "Attempting to send system notification '{}' to {} devs",
            payload.text_key(),
            devs.len()
        );

        join_all(
            devs.iter()
                .map(|dev| async move { self.send(dev, payload).await.is_some() }),
        )
        .await
    }

    pub async fn notify_super_dev(&self, dev: Option<&User>, payload: &MessagePayload) -> bool {
        let temp_dev;
        let dev = match dev {
            Some(dev) => dev,
            None => {
                temp_dev = self.temp_dev();
                &temp_dev
            }
        };

        if dev.telegram_id != self.config.bot.dev_id {
            warn!(
                "Skipping super dev notification: user ID does not match configured dev_id '{}'",
                self.config.bot.dev_id
            );
            return false;
        }

        debug!(
            "Attempting to send super dev notification '{}' to '{}'",
            payload.text_key(),
            dev.telegram_id
        );
        self.send(dev, payload).await.is_some()
    }

    /// Delivers one payload. Transport failures are logged and yield `None`.
    pub async fn send(&self, user: &User, payload: &MessagePayload) -> Option<SentMessage> {
        let chat_id = user.telegram_id;
        let text = if payload.text_key().is_empty() {
            None
        } else {
            Some(
                self.translator
                    .render(user.language, payload.text_key(), payload.template_args()),
            )
        };
        let reply_markup = self.prepare_reply_markup(payload, user.language, chat_id);
        let effect = payload.message_effect();

        let result = match (payload.media(), payload.media_type()) {
            (Some(media), Some(media_type)) => {
                self.transport
                    .send_media(chat_id, media_type, media.clone(), text, reply_markup, effect)
                    .await
            }
            (media, _) => {
                if media.is_some() {
                    warn!(
                        "Validation error: Media provided but media_type is missing for chat '{}'. Sending as text message",
                        chat_id
                    );
                }
                self.transport
                    .send_text(chat_id, text.unwrap_or_default(), reply_markup, effect)
                    .await
            }
        };

        match result {
            Ok(sent) => {
                if let Some(delay) = payload.auto_delete_after() {
                    self.scheduler.arm(sent.chat_id, sent.message_id, delay);
                }
                Some(sent)
            }
            Err(e) => {
                error!(
                    chat_id,
                    text_key = payload.text_key(),
                    error = %e,
                    "Failed to send notification"
                );
                None
            }
        }
    }

    fn prepare_reply_markup(
        &self,
        payload: &MessagePayload,
        locale: Locale,
        chat_id: i64,
    ) -> Option<ReplyMarkup> {
        let markup = payload.reply_markup().cloned();
        if !payload.add_close_button() || payload.auto_delete_after().is_some() {
            return markup;
        }

        let close_button = InlineKeyboardButton::callback(
            self.translator.button_label(locale, CLOSE_BUTTON_KEY),
            CLOSE_NOTIFICATION_CALLBACK,
        );

        match markup {
            None => Some(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new([[
                close_button,
            ]]))),
            Some(ReplyMarkup::InlineKeyboard(mut keyboard)) => {
                keyboard.inline_keyboard.push(vec![close_button]);
                Some(ReplyMarkup::InlineKeyboard(keyboard))
            }
            Some(other) => {
                warn!(
                    "Unsupported reply_markup type for chat '{}'. Close button will not be added",
                    chat_id
                );
                Some(other)
            }
        }
    }

    fn temp_dev(&self) -> User {
        warn!("Dev is empty! Adding a fallback dev from environment config");
        User::new(
            self.config.bot.dev_id,
            "TempDev",
            UserRole::Dev,
            self.config.i18n.default_locale,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use teloxide::types::{KeyboardButton, KeyboardMarkup};
    use tokio::time::Instant;
    use tracing::subscriber::DefaultGuard;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;
    use crate::config::test_config;
    use crate::error::NotifyError;
    use crate::i18n::FluentTranslator;
    use crate::notification::payload::{MediaFile, MediaType};
    use crate::notification::settings::{SYSTEM_SETTINGS_KEY, USER_SETTINGS_KEY};
    use crate::storage::cache::memory::MemoryStore;
    use crate::storage::cache::SettingsRepository;
    use crate::telegram::transport::MockTransport;

    const DEV_ID: i64 = 1000;

    fn service_with(transport: MockTransport, store: MemoryStore) -> NotificationService {
        NotificationService::new(
            Arc::new(test_config(DEV_ID)),
            Arc::new(transport),
            Arc::new(FluentTranslator),
            NotificationSettingsStore::new(SettingsRepository::new(Arc::new(store))),
        )
    }

    fn service(transport: MockTransport) -> NotificationService {
        service_with(transport, MemoryStore::default())
    }

    fn user(id: i64) -> User {
        User::new(id, "Alice", UserRole::User, Locale::En)
    }

    fn sent(chat_id: i64, message_id: i32) -> SentMessage {
        SentMessage { chat_id, message_id }
    }

    /// Counts WARN events emitted on the current thread.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn count_warnings() -> (Arc<AtomicUsize>, DefaultGuard) {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
        (warnings, tracing::subscriber::set_default(subscriber))
    }

    fn button_count(markup: &Option<ReplyMarkup>) -> usize {
        match markup {
            Some(ReplyMarkup::InlineKeyboard(k)) => k.inline_keyboard.iter().map(Vec::len).sum(),
            _ => 0,
        }
    }

    #[tokio::test]
    async fn test_missing_user_sends_nothing() {
        let mut transport = MockTransport::new();
        transport.expect_send_text().never();
        let payload = MessagePayload::builder("ntf-welcome").build();

        assert!(!service(transport).notify_user(None, &payload, None).await);
    }

    #[tokio::test]
    async fn test_disabled_user_type_sends_nothing() {
        let mut transport = MockTransport::new();
        transport.expect_send_text().never();
        transport.expect_send_media().never();
        let store = MemoryStore::with_entry(USER_SETTINGS_KEY, r#"{"subscription_ended": false}"#);
        let payload = MessagePayload::builder("ntf-welcome").build();

        let delivered = service_with(transport, store)
            .notify_user(
                Some(&user(42)),
                &payload,
                Some(UserNotificationType::SubscriptionEnded),
            )
            .await;
        assert!(!delivered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_welcome_is_sent_then_deleted_in_background() {
        let deleted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&deleted);

        let mut transport = MockTransport::new();
        transport
            .expect_send_text()
            .withf(|chat, text, markup, effect| {
                *chat == 42 && text.contains("Alice") && markup.is_none() && effect.is_none()
            })
            .times(1)
            .returning(|chat, _, _, _| Ok(sent(chat, 555)));
        transport
            .expect_delete_message()
            .withf(|chat, msg| *chat == 42 && *msg == 555)
            .times(1)
            .returning(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        let service = service(transport);
        let payload = MessagePayload::builder("ntf-welcome")
            .auto_delete_after(Some(5))
            .arg("name", "Alice")
            .build();

        let started = Instant::now();
        assert!(service.notify_user(Some(&user(42)), &payload, None).await);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(deleted.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(deleted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_timer_never_arms_deletion() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_text()
            .times(1)
            .returning(|chat, _, _, _| Ok(sent(chat, 1)));
        transport.expect_delete_message().never();
        let payload = MessagePayload::builder("ntf-welcome")
            .auto_delete_after(None)
            .build();

        assert!(service(transport).notify_user(Some(&user(42)), &payload, None).await);
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }

    #[tokio::test]
    async fn test_transport_failure_returns_false() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_text()
            .times(1)
            .returning(|_, _, _, _| Err(NotifyError::Config("bot was blocked by the user".to_string())));
        transport.expect_delete_message().never();
        let payload = MessagePayload::builder("ntf-welcome").build();

        assert!(!service(transport).notify_user(Some(&user(42)), &payload, None).await);
    }

    #[tokio::test]
    async fn test_missing_template_arg_still_delivers() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_text()
            .withf(|chat, text, _, _| *chat == 42 && text.contains("Carol"))
            .times(1)
            .returning(|chat, _, _, _| Ok(sent(chat, 1)));
        let payload = MessagePayload::builder("ntf-event-new-user")
            .auto_delete_after(None)
            .arg("name", "Carol")
            .build();

        assert!(service(transport).notify_user(Some(&user(42)), &payload, None).await);
    }

    #[tokio::test]
    async fn test_media_without_type_falls_back_to_text() {
        let (warnings, _guard) = count_warnings();
        let mut transport = MockTransport::new();
        transport.expect_send_media().never();
        transport
            .expect_send_text()
            .times(1)
            .returning(|chat, _, _, _| Ok(sent(chat, 1)));
        let payload = MessagePayload::builder("ntf-event-bot-startup")
            .untyped_media(MediaFile::memory(b"abc".to_vec(), "a.txt"))
            .auto_delete_after(None)
            .build();

        assert!(service(transport).notify_user(Some(&user(42)), &payload, None).await);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_media_with_type_uses_media_send_with_caption() {
        let mut transport = MockTransport::new();
        transport.expect_send_text().never();
        transport
            .expect_send_media()
            .withf(|chat, kind, media, caption, _, _| {
                *chat == 42
                    && *kind == MediaType::Document
                    && matches!(media, MediaFile::Memory { file_name, .. } if file_name == "a.txt")
                    && caption.as_deref() == Some("✅ Bot started")
            })
            .times(1)
            .returning(|chat, _, _, _, _, _| Ok(sent(chat, 1)));
        let payload = MessagePayload::builder("ntf-event-bot-startup")
            .media(MediaFile::memory(b"abc".to_vec(), "a.txt"), MediaType::Document)
            .auto_delete_after(None)
            .build();

        assert!(service(transport).notify_user(Some(&user(42)), &payload, None).await);
    }

    #[tokio::test]
    async fn test_empty_text_key_renders_nothing() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_media()
            .withf(|_, _, _, caption, _, _| caption.is_none())
            .times(1)
            .returning(|chat, _, _, _, _, _| Ok(sent(chat, 1)));
        let payload = MessagePayload::builder("")
            .media(MediaFile::memory(b"abc".to_vec(), "a.png"), MediaType::Photo)
            .auto_delete_after(None)
            .build();

        assert!(service(transport).notify_user(Some(&user(42)), &payload, None).await);
    }

    #[tokio::test]
    async fn test_close_button_synthesized_when_no_keyboard() {
        let captured = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&captured);

        let mut transport = MockTransport::new();
        transport
            .expect_send_text()
            .times(1)
            .returning(move |chat, _, markup, _| {
                *slot.lock().unwrap() = Some(markup);
                Ok(sent(chat, 1))
            });
        let payload = MessagePayload::builder("ntf-event-bot-startup")
            .auto_delete_after(None)
            .close_button(true)
            .build();

        assert!(service(transport).notify_user(Some(&user(42)), &payload, None).await);

        let markup = captured.lock().unwrap().take().unwrap();
        assert_eq!(button_count(&markup), 1);
        let Some(ReplyMarkup::InlineKeyboard(keyboard)) = markup else {
            panic!("expected inline keyboard");
        };
        assert_eq!(keyboard.inline_keyboard[0][0].text, "❌ Close");
    }

    #[test]
    fn test_close_button_appended_to_inline_keyboard() {
        let service = service(MockTransport::new());
        let keyboard = InlineKeyboardMarkup::new([[
            InlineKeyboardButton::callback("A", "a"),
            InlineKeyboardButton::callback("B", "b"),
        ]]);
        let input = Some(ReplyMarkup::InlineKeyboard(keyboard));
        let payload = MessagePayload::builder("ntf-event-bot-startup")
            .reply_markup(input.clone().unwrap())
            .auto_delete_after(None)
            .close_button(true)
            .build();

        let markup = service.prepare_reply_markup(&payload, Locale::Ru, 42);
        assert_eq!(button_count(&markup), button_count(&input) + 1);
        let Some(ReplyMarkup::InlineKeyboard(keyboard)) = markup else {
            panic!("expected inline keyboard");
        };
        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert_eq!(keyboard.inline_keyboard[1][0].text, "❌ Закрыть");
    }

    #[test]
    fn test_close_button_skipped_for_self_deleting_message() {
        let service = service(MockTransport::new());
        let payload = MessagePayload::builder("ntf-welcome")
            .close_button(true)
            .build();

        assert!(service.prepare_reply_markup(&payload, Locale::En, 42).is_none());
    }

    #[test]
    fn test_unsupported_keyboard_left_untouched() {
        let service = service(MockTransport::new());
        let keyboard = KeyboardMarkup::new([[KeyboardButton::new("Menu")]]);
        let payload = MessagePayload::builder("ntf-welcome")
            .reply_markup(keyboard.clone())
            .auto_delete_after(None)
            .close_button(true)
            .build();

        let markup = service.prepare_reply_markup(&payload, Locale::En, 42);
        assert_eq!(markup, Some(ReplyMarkup::Keyboard(keyboard)));
    }

    #[tokio::test]
    async fn test_system_notify_disabled_with_empty_devs_sends_nothing() {
        let mut transport = MockTransport::new();
        transport.expect_send_text().never();
        transport.expect_send_media().never();
        let store = MemoryStore::with_entry(SYSTEM_SETTINGS_KEY, r#"{"user_registered": false}"#);
        let payload = MessagePayload::builder("ntf-event-new-user").build();

        let results = service_with(transport, store)
            .system_notify(&[], &payload, SystemNotificationType::UserRegistered)
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_system_notify_empty_devs_uses_single_fallback() {
        let (warnings, _guard) = count_warnings();
        let mut transport = MockTransport::new();
        transport
            .expect_send_text()
            .withf(|chat, _, _, _| *chat == DEV_ID)
            .times(1)
            .returning(|chat, _, _, _| Ok(sent(chat, 1)));
        let payload = MessagePayload::builder("ntf-event-bot-startup")
            .auto_delete_after(None)
            .build();

        let results = service(transport)
            .system_notify(&[], &payload, SystemNotificationType::BotLifetime)
            .await;
        assert_eq!(results, vec![true]);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_system_notify_keeps_order_and_isolates_failures() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_text()
            .times(3)
            .returning(|chat, _, _, _| {
                if chat == 2 {
                    Err(NotifyError::Config("chat not found".to_string()))
                } else {
                    Ok(sent(chat, 1))
                }
            });
        let devs = [user(1), user(2), user(3)];
        let payload = MessagePayload::builder("ntf-event-bot-startup")
            .auto_delete_after(None)
            .build();

        let results = service(transport)
            .system_notify(&devs, &payload, SystemNotificationType::BotLifetime)
            .await;
        assert_eq!(results, vec![true, false, true]);
    }

    #[tokio::test]
    async fn test_super_dev_rejects_mismatched_id() {
        let mut transport = MockTransport::new();
        transport.expect_send_text().never();
        transport.expect_send_media().never();
        let impostor = User::new(DEV_ID + 1, "Mallory", UserRole::Dev, Locale::En);
        let payload = MessagePayload::builder("ntf-event-error")
            .media(MediaFile::memory(b"trace".to_vec(), "error_1.txt"), MediaType::Document)
            .build();

        assert!(!service(transport).notify_super_dev(Some(&impostor), &payload).await);
    }

    #[tokio::test]
    async fn test_super_dev_ignores_settings_gate() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_text()
            .withf(|chat, _, _, _| *chat == DEV_ID)
            .times(1)
            .returning(|chat, _, _, _| Ok(sent(chat, 1)));
        let store = MemoryStore::with_entry(SYSTEM_SETTINGS_KEY, r#"{"critical_error": false}"#);
        let payload = MessagePayload::builder("ntf-event-bot-shutdown")
            .auto_delete_after(None)
            .build();

        assert!(service_with(transport, store).notify_super_dev(None, &payload).await);
    }
}
