//! Streaks, achievements, notifications and revision planning.
//!
//! Nothing here is persisted. Stats are computed from the store on demand;
//! feeds and revision schedules live in memory for the life of the process.

mod achievements;
mod notifications;
mod revision;
mod stats;

pub use achievements::{
    Achievement, AchievementCategory, CATALOG, Rarity, evaluate, filter, newly_unlocked,
};
pub use notifications::{
    INACTIVITY_DAYS, Notification, NotificationFeed, NotificationFilter, NotificationKind, Priority,
};
pub use revision::{
    MAX_REVISION_DAYS, QUICK_PICKS, REVISION_HOUR, RevisionPlanner, RevisionSchedule,
    RevisionSuggestion, ScheduleStatus, schedule_at, suggest,
};
pub use stats::{UserStats, streaks};
