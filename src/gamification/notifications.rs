use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Achievement, RevisionSchedule, newly_unlocked};
use crate::service::SubjectActivity;
use crate::utils::SECONDS_PER_DAY;

/// Days without activity before a subject earns a nudge.
pub const INACTIVITY_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RevisionReminder,
    InactivityNudge,
    Achievement,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Views over a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
    Revision,
    System,
}

impl NotificationFilter {
    fn matches(self, notification: &Notification) -> bool {
        match self {
            Self::All => true,
            Self::Unread => !notification.read,
            Self::Revision => notification.kind == NotificationKind::RevisionReminder,
            Self::System => matches!(
                notification.kind,
                NotificationKind::System | NotificationKind::InactivityNudge
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub read: bool,
    pub priority: Priority,
}

/// In-memory notification list for one user, newest first.
///
/// Generated notifications carry a key; a key is only ever used once, so
/// refreshing repeatedly does not duplicate anything, even after removal.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    items: Vec<Notification>,
    next_id: u64,
    seen_keys: HashSet<String>,
    achievements: Vec<Achievement>,
}

impl NotificationFeed {
    /// Creates a feed holding the welcome notification.
    pub fn new(now: OffsetDateTime) -> Self {
        let mut feed = Self {
            items: Vec::new(),
            next_id: 1,
            seen_keys: HashSet::new(),
            achievements: Vec::new(),
        };
        feed.push_keyed(
            "welcome".to_string(),
            NotificationKind::System,
            "Welcome to CogniCanvas!",
            "Start creating subjects and notebooks to organize your learning journey.".to_string(),
            Priority::Low,
            now,
        );
        feed
    }

    /// Adds a notification at the front and returns its id.
    pub fn push(
        &mut self,
        kind: NotificationKind,
        title: &str,
        message: String,
        priority: Priority,
        now: OffsetDateTime,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.insert(
            0,
            Notification {
                id,
                kind,
                title: title.to_string(),
                message,
                timestamp: now,
                read: false,
                priority,
            },
        );
        id
    }

    fn push_keyed(
        &mut self,
        key: String,
        kind: NotificationKind,
        title: &str,
        message: String,
        priority: Priority,
        now: OffsetDateTime,
    ) -> Option<u64> {
        if !self.seen_keys.insert(key) {
            return None;
        }
        Some(self.push(kind, title, message, priority, now))
    }

    /// Generates notifications from the current state of the user's data.
    ///
    /// Produces one per newly unlocked achievement, one per subject idle for
    /// [`INACTIVITY_DAYS`] or more, and one per revision due today. Returns
    /// how many were added.
    pub fn refresh(
        &mut self,
        achievements: &[Achievement],
        activity: &[SubjectActivity],
        due: &[RevisionSchedule],
        now: OffsetDateTime,
    ) -> usize {
        let mut added = 0;

        for achievement in newly_unlocked(&self.achievements, achievements) {
            let key = format!("achievement:{}", achievement.id);
            let message = format!(
                "{} {}: {}",
                achievement.icon, achievement.title, achievement.description
            );
            added += self
                .push_keyed(
                    key,
                    NotificationKind::Achievement,
                    "Achievement Unlocked!",
                    message,
                    Priority::Low,
                    now,
                )
                .map_or(0, |_| 1);
        }
        self.achievements = achievements.to_vec();

        let now_secs = now.unix_timestamp();
        for entry in activity {
            let idle_days = (now_secs - entry.last_activity.unix_timestamp()) / SECONDS_PER_DAY;
            if idle_days < INACTIVITY_DAYS {
                continue;
            }
            let key = format!(
                "inactive:{}:{}",
                entry.subject.id,
                entry.last_activity.unix_timestamp()
            );
            let message = format!(
                "It's been {idle_days} days since you last visited your {} notes. Maybe it's time for a review?",
                entry.subject.name
            );
            added += self
                .push_keyed(
                    key,
                    NotificationKind::InactivityNudge,
                    "Feeling distant?",
                    message,
                    Priority::Medium,
                    now,
                )
                .map_or(0, |_| 1);
        }

        for schedule in due {
            let key = format!("revision:{}", schedule.id);
            let message = format!(
                "Time to review \"{}\". Revisiting it now will help it stick.",
                schedule.note_title
            );
            added += self
                .push_keyed(
                    key,
                    NotificationKind::RevisionReminder,
                    "Revision Reminder",
                    message,
                    Priority::High,
                    now,
                )
                .map_or(0, |_| 1);
        }

        if added > 0 {
            tracing::debug!(added, "notifications generated");
        }
        added
    }

    pub fn list(&self, filter: NotificationFilter) -> Vec<Notification> {
        self.items
            .iter()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Marks one notification read. Returns false if it does not exist.
    pub fn mark_read(&mut self, id: u64) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for notification in &mut self.items {
            notification.read = true;
        }
    }

    /// Removes one notification. Returns false if it does not exist.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
