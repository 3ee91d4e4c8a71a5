use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Which settings object owns a notification flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationScope {
    System,
    User,
}

/// Operator-facing events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, IntoStaticStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SystemNotificationType {
    BotLifetime,
    UserRegistered,
    Subscription,
    PromocodeActivated,
    CriticalError,
    SystemUpdate,
}

/// Events delivered to end users.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, IntoStaticStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserNotificationType {
    #[strum(serialize = "subscription_3_days_left")]
    #[serde(rename = "subscription_3_days_left")]
    Subscription3DaysLeft,
    #[strum(serialize = "subscription_24_hours_left")]
    #[serde(rename = "subscription_24_hours_left")]
    Subscription24HoursLeft,
    SubscriptionEnded,
    AvailableAfterMaintenance,
}

/// A notification type tagged with its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    System(SystemNotificationType),
    User(UserNotificationType),
}

impl NotificationType {
    pub fn scope(&self) -> NotificationScope {
        match self {
            NotificationType::System(_) => NotificationScope::System,
            NotificationType::User(_) => NotificationScope::User,
        }
    }

    /// Settings key of the flag controlling this type.
    pub fn key(&self) -> &'static str {
        match self {
            NotificationType::System(t) => (*t).into(),
            NotificationType::User(t) => (*t).into(),
        }
    }

    /// Resolves a settings key to its type; keys are unique across scopes.
    pub fn from_key(key: &str) -> Option<Self> {
        if let Ok(t) = key.parse::<SystemNotificationType>() {
            return Some(NotificationType::System(t));
        }
        key.parse::<UserNotificationType>().ok().map(NotificationType::User)
    }

    pub fn all() -> impl Iterator<Item = NotificationType> {
        SystemNotificationType::iter()
            .map(NotificationType::System)
            .chain(UserNotificationType::iter().map(NotificationType::User))
    }
}

impl From<SystemNotificationType> for NotificationType {
    fn from(t: SystemNotificationType) -> Self {
        NotificationType::System(t)
    }
}

impl From<UserNotificationType> for NotificationType {
    fn from(t: UserNotificationType) -> Self {
        NotificationType::User(t)
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_round_trip_through_from_key() {
        for ty in NotificationType::all() {
            assert_eq!(NotificationType::from_key(ty.key()), Some(ty));
        }
        assert_eq!(NotificationType::from_key("torrent_block"), None);
    }

    #[test]
    fn test_keys_are_unique_across_scopes() {
        let keys: HashSet<_> = NotificationType::all().map(|t| t.key()).collect();
        assert_eq!(keys.len(), NotificationType::all().count());
    }

    #[test]
    fn test_scope_is_fixed_by_variant() {
        assert_eq!(
            NotificationType::from(SystemNotificationType::CriticalError).scope(),
            NotificationScope::System
        );
        assert_eq!(
            NotificationType::from(UserNotificationType::SubscriptionEnded).scope(),
            NotificationScope::User
        );
        assert_eq!(UserNotificationType::Subscription3DaysLeft.as_ref(), "subscription_3_days_left");
    }
}
