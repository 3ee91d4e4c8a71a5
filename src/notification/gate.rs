use tracing::error;

use crate::notification::settings::NotificationSettingsStore;
use crate::notification::types::NotificationType;

/// Decides whether a notification type may be sent right now.
#[derive(Clone)]
pub struct DispatchGate {
    settings: NotificationSettingsStore,
}

impl DispatchGate {
    pub fn new(settings: NotificationSettingsStore) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &NotificationSettingsStore {
        &self.settings
    }

    /// `None` bypasses the gate. Unreadable settings count as defaults.
    pub async fn is_enabled(&self, ntf_type: Option<NotificationType>) -> bool {
        let Some(ntf_type) = ntf_type else {
            return true;
        };

        match self.settings.is_enabled(ntf_type).await {
            Ok(enabled) => enabled,
            Err(e) => {
                error!(
                    ntf_type = %ntf_type,
                    error = %e,
                    "Failed to read notification settings, falling back to defaults"
                );
                true
            }
        }
    }
}
