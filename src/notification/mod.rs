pub mod gate;
pub mod payload;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod tasks;
pub mod types;

pub use payload::{MediaFile, MediaType, MessageEffect, MessagePayload, TemplateArgs};
pub use service::{NotificationService, CLOSE_NOTIFICATION_CALLBACK};
pub use settings::{
    NotificationFlags, NotificationSettingsStore, SystemNotificationSettings, UserNotificationSettings,
};
pub use types::{NotificationScope, NotificationType, SystemNotificationType, UserNotificationType};
