use std::collections::HashMap;

use serde::Serialize;
use time::{Duration, OffsetDateTime, Time};

use crate::models::{NoteId, UserId};
use crate::utils::day_number;

/// Hour of day (UTC) revisions are scheduled for.
pub const REVISION_HOUR: u8 = 10;

/// Longest interval a revision can be scheduled ahead, in days.
pub const MAX_REVISION_DAYS: u32 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevisionSuggestion {
    pub label: &'static str,
    pub days: u32,
    pub description: &'static str,
}

const fn pick(label: &'static str, days: u32, description: &'static str) -> RevisionSuggestion {
    RevisionSuggestion {
        label,
        days,
        description,
    }
}

/// Fixed intervals offered alongside the smart suggestion.
pub const QUICK_PICKS: [RevisionSuggestion; 5] = [
    pick("Tomorrow", 1, "Quick review to reinforce learning"),
    pick("In 3 days", 3, "Optimal for memory retention"),
    pick("In 1 week", 7, "Weekly review session"),
    pick("In 2 weeks", 14, "Bi-weekly consolidation"),
    pick("In 1 month", 30, "Monthly comprehensive review"),
];

/// Next interval for a note that has been revised `study_count` times.
pub fn suggest(study_count: u32) -> RevisionSuggestion {
    match study_count {
        0 => pick("First Review", 1, "Review within 24 hours for best retention"),
        1 => pick("Second Review", 3, "Reinforce after 3 days"),
        2..=4 => pick("Regular Review", 7, "Weekly review schedule"),
        _ => pick("Master Review", 14, "Bi-weekly for mastery"),
    }
}

/// `days` after `now`, at [`REVISION_HOUR`] UTC.
///
/// Returns `None` when the target date is outside the supported calendar.
pub fn schedule_at(now: OffsetDateTime, days: u32) -> Option<OffsetDateTime> {
    let date = now.date().checked_add(Duration::days(i64::from(days)))?;
    Some(
        date.with_time(Time::MIDNIGHT + Duration::hours(i64::from(REVISION_HOUR)))
            .assume_utc(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
    Overdue,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSchedule {
    pub id: u64,
    pub note_id: NoteId,
    pub note_title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    pub completed: bool,
}

impl RevisionSchedule {
    pub fn status(&self, now: OffsetDateTime) -> ScheduleStatus {
        if self.completed {
            ScheduleStatus::Completed
        } else if self.scheduled_at < now {
            ScheduleStatus::Overdue
        } else {
            ScheduleStatus::Scheduled
        }
    }
}

#[derive(Debug, Default)]
struct UserRevisions {
    schedules: Vec<RevisionSchedule>,
    study_counts: HashMap<NoteId, u32>,
}

/// In-memory revision schedules for all users.
#[derive(Debug, Default)]
pub struct RevisionPlanner {
    users: HashMap<UserId, UserRevisions>,
    next_id: u64,
}

impl RevisionPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a revision of a note `days` from `now`.
    ///
    /// Returns `None`, recording nothing, when the date cannot be represented.
    pub fn schedule(
        &mut self,
        user: &UserId,
        note_id: NoteId,
        note_title: &str,
        days: u32,
        now: OffsetDateTime,
    ) -> Option<RevisionSchedule> {
        let scheduled_at = schedule_at(now, days)?;
        self.next_id += 1;
        let schedule = RevisionSchedule {
            id: self.next_id,
            note_id,
            note_title: note_title.to_string(),
            scheduled_at,
            completed: false,
        };
        self.users
            .entry(user.clone())
            .or_default()
            .schedules
            .push(schedule.clone());
        tracing::debug!(user = %user, note = %note_id, days, "revision scheduled");
        Some(schedule)
    }

    /// Marks a schedule completed and counts a study session for its note.
    ///
    /// Returns `None` when the user has no schedule with this id. Completing
    /// twice counts once.
    pub fn complete(&mut self, user: &UserId, id: u64) -> Option<RevisionSchedule> {
        let revisions = self.users.get_mut(user)?;
        let schedule = revisions.schedules.iter_mut().find(|s| s.id == id)?;
        if !schedule.completed {
            schedule.completed = true;
            *revisions.study_counts.entry(schedule.note_id).or_default() += 1;
        }
        Some(schedule.clone())
    }

    pub fn schedules(&self, user: &UserId) -> &[RevisionSchedule] {
        self.users
            .get(user)
            .map(|r| r.schedules.as_slice())
            .unwrap_or_default()
    }

    pub fn study_count(&self, user: &UserId, note_id: NoteId) -> u32 {
        self.users
            .get(user)
            .and_then(|r| r.study_counts.get(&note_id))
            .copied()
            .unwrap_or(0)
    }

    /// Completed revision sessions across all notes.
    pub fn total_revisions(&self, user: &UserId) -> u32 {
        self.users
            .get(user)
            .map(|r| r.study_counts.values().sum())
            .unwrap_or(0)
    }

    /// Open schedules whose day is today.
    pub fn due_today(&self, user: &UserId, now: OffsetDateTime) -> Vec<RevisionSchedule> {
        let today = day_number(now);
        self.schedules(user)
            .iter()
            .filter(|s| !s.completed && day_number(s.scheduled_at) == today)
            .cloned()
            .collect()
    }

    /// Drops every schedule and the study count of a deleted note.
    pub fn forget_note(&mut self, user: &UserId, note_id: NoteId) {
        if let Some(revisions) = self.users.get_mut(user) {
            revisions.schedules.retain(|s| s.note_id != note_id);
            revisions.study_counts.remove(&note_id);
        }
    }
}
