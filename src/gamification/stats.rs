use serde::Serialize;
use time::OffsetDateTime;

/// Activity totals for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_subjects: u32,
    pub total_notebooks: u32,
    pub total_notes: u32,
    pub total_important_snippets: u32,
    pub total_revisions: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_active: Option<OffsetDateTime>,
}

/// Current and longest runs of consecutive active days.
///
/// `active_days` are day numbers in any order, duplicates allowed. Days after
/// `today` are ignored. The current streak counts only if its last day is
/// today or yesterday.
pub fn streaks(active_days: &[i64], today: i64) -> (u32, u32) {
    let mut days: Vec<i64> = active_days.iter().copied().filter(|d| *d <= today).collect();
    days.sort_unstable();
    days.dedup();

    let mut longest = 0;
    let mut run = 0;
    let mut previous = None;
    for &day in &days {
        run = if previous == Some(day - 1) { run + 1 } else { 1 };
        longest = longest.max(run);
        previous = Some(day);
    }

    let current = match days.last() {
        Some(&last) if last >= today - 1 => run,
        _ => 0,
    };
    (current, longest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_activity_has_no_streak() {
        assert_eq!(streaks(&[], 100), (0, 0));
    }

    #[test]
    fn streak_ending_today() {
        assert_eq!(streaks(&[98, 99, 100, 100], 100), (3, 3));
    }

    #[test]
    fn streak_ending_yesterday_still_counts() {
        assert_eq!(streaks(&[97, 98, 99], 100), (3, 3));
    }

    #[test]
    fn broken_streak_keeps_longest() {
        assert_eq!(streaks(&[90, 91, 92, 93, 97], 100), (0, 4));
        assert_eq!(streaks(&[90, 91, 92, 93, 99, 100], 100), (2, 4));
    }

    #[test]
    fn future_days_are_ignored() {
        assert_eq!(streaks(&[100, 101, 102], 100), (1, 1));
    }

    #[test]
    fn stats_serialize_camel_case() {
        let json = serde_json::to_value(UserStats::default()).unwrap();
        assert_eq!(json["currentStreak"], 0);
        assert!(json["lastActive"].is_null());
    }
}
