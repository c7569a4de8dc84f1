use serde::{Deserialize, Serialize};

use crate::review::Review;

/// Identifier the platform sink registers the recurring reminder under.
/// Scheduling again with the same identifier replaces the existing trigger
/// instead of duplicating it.
pub const DAILY_REMINDER_ID: &str = "daily-review-notification";

/// Preference-store key holding the serialized [`NotificationTime`].
pub const NOTIFICATION_TIME_KEY: &str = "revisa:notification_time";

/// Wall-clock time of day at which the daily reminder fires.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationTime {
    pub hour: u32,
    pub minute: u32,
}

impl Default for NotificationTime {
    fn default() -> Self {
        Self { hour: 8, minute: 0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// Reminder copy shown by the daily notification.
pub fn daily_reminder_content() -> NotificationContent {
    NotificationContent {
        title: "Hora de revisar! 📚".to_string(),
        body: "Opa, é hora de verificar as revisões de hoje! Não vamos perder o foco, hein..."
            .to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// What the recurring reminder should look like after a reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderAction {
    ScheduleDaily(NotificationTime),
    CancelDaily,
}

pub fn should_notify(due_today: &[Review]) -> bool {
    !due_today.is_empty()
}

/// Decides the reminder state from today's due set. Applying the same
/// action twice is safe: triggers registered under [`DAILY_REMINDER_ID`]
/// replace each other.
pub fn reconcile(due_today: &[Review], preferred: NotificationTime) -> ReminderAction {
    if should_notify(due_today) {
        ReminderAction::ScheduleDaily(preferred)
    } else {
        ReminderAction::CancelDaily
    }
}

/// Platform-specific notification adapters implement this.
pub trait NotificationSink: Send + Sync {
    fn schedule_daily(
        &self,
        trigger: NotificationTime,
        content: &NotificationContent,
        identifier: &str,
    ) -> anyhow::Result<()>;
    fn cancel(&self, identifier: &str) -> anyhow::Result<()>;
    fn cancel_all(&self) -> anyhow::Result<()>;
    fn permission(&self) -> PermissionStatus;
    fn request_permission(&self) -> PermissionStatus;
}

/// Platform key-value storage for small user preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Reads the preferred reminder time, falling back to 08:00 when nothing
/// usable is stored.
pub fn load_notification_time(store: &dyn PreferenceStore) -> NotificationTime {
    match store.get(NOTIFICATION_TIME_KEY) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(time) => time,
            Err(error) => {
                tracing::warn!(%error, "stored notification time is unreadable, using default");
                NotificationTime::default()
            }
        },
        Ok(None) => NotificationTime::default(),
        Err(error) => {
            tracing::warn!(%error, "failed to read notification time, using default");
            NotificationTime::default()
        }
    }
}

pub fn save_notification_time(
    store: &dyn PreferenceStore,
    time: NotificationTime,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(&time)?;
    store.set(NOTIFICATION_TIME_KEY, &raw)
}
