use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::UserStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Streak,
    Content,
    Engagement,
    Mastery,
}

impl AchievementCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Streak => "streak",
            Self::Content => "content",
            Self::Engagement => "engagement",
            Self::Mastery => "mastery",
        }
    }
}

impl fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "streak" => Ok(Self::Streak),
            "content" => Ok(Self::Content),
            "engagement" => Ok(Self::Engagement),
            "mastery" => Ok(Self::Mastery),
            other => Err(format!("unknown achievement category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Stat an achievement measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    CurrentStreak,
    TotalNotes,
    TotalSubjects,
    TotalImportantSnippets,
    TotalRevisions,
}

impl Metric {
    fn read(self, stats: &UserStats) -> u32 {
        match self {
            Self::CurrentStreak => stats.current_streak,
            Self::TotalNotes => stats.total_notes,
            Self::TotalSubjects => stats.total_subjects,
            Self::TotalImportantSnippets => stats.total_important_snippets,
            Self::TotalRevisions => stats.total_revisions,
        }
    }
}

/// Static description of one achievement.
#[derive(Debug)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    metric: Metric,
    threshold: u32,
}

macro_rules! achievement {
    ($id:literal, $title:literal, $description:literal, $icon:literal, $category:ident, $rarity:ident, $metric:ident, $threshold:literal) => {
        AchievementDef {
            id: $id,
            title: $title,
            description: $description,
            icon: $icon,
            category: AchievementCategory::$category,
            rarity: Rarity::$rarity,
            metric: Metric::$metric,
            threshold: $threshold,
        }
    };
}

/// Every achievement, in display order.
pub const CATALOG: &[AchievementDef] = &[
    achievement!("streak_3", "Getting Started", "Maintain a 3-day streak", "🔥", Streak, Common, CurrentStreak, 3),
    achievement!("streak_7", "Week Warrior", "Maintain a 7-day streak", "🗓️", Streak, Rare, CurrentStreak, 7),
    achievement!("streak_30", "Monthly Master", "Maintain a 30-day streak", "🌙", Streak, Epic, CurrentStreak, 30),
    achievement!("streak_100", "Century Club", "Maintain a 100-day streak", "💯", Streak, Legendary, CurrentStreak, 100),
    achievement!("content_10_notes", "Note Taker", "Create 10 notes", "📝", Content, Common, TotalNotes, 10),
    achievement!("content_50_notes", "Prolific Writer", "Create 50 notes", "📚", Content, Rare, TotalNotes, 50),
    achievement!("content_5_subjects", "Subject Expert", "Create 5 subjects", "🎓", Content, Rare, TotalSubjects, 5),
    achievement!("engagement_10_important", "Highlight Master", "Mark 10 snippets as important", "⭐", Engagement, Common, TotalImportantSnippets, 10),
    achievement!("engagement_5_revisions", "Revision Regular", "Complete 5 revision sessions", "🔄", Engagement, Common, TotalRevisions, 5),
    achievement!("mastery_first_subject", "Subject Pioneer", "Create your first subject", "🚀", Mastery, Common, TotalSubjects, 1),
    achievement!("mastery_first_note", "Note Creator", "Create your first note", "✨", Mastery, Common, TotalNotes, 1),
];

/// An achievement evaluated against a user's stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub unlocked: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub unlocked_at: Option<OffsetDateTime>,
    pub progress: u32,
    pub max_progress: u32,
}

/// Evaluates the whole catalog.
///
/// Progress is clamped to the threshold. Only streak achievements carry an
/// `unlocked_at`, set to the user's last activity.
pub fn evaluate(stats: &UserStats) -> Vec<Achievement> {
    CATALOG
        .iter()
        .map(|def| {
            let value = def.metric.read(stats);
            let unlocked = value >= def.threshold;
            let unlocked_at = (unlocked && def.category == AchievementCategory::Streak)
                .then_some(stats.last_active)
                .flatten();
            Achievement {
                id: def.id,
                title: def.title,
                description: def.description,
                icon: def.icon,
                category: def.category,
                rarity: def.rarity,
                unlocked,
                unlocked_at,
                progress: value.min(def.threshold),
                max_progress: def.threshold,
            }
        })
        .collect()
}

/// Keeps achievements matching the category (all when `None`) and, when
/// `unlocked_only`, only unlocked ones.
pub fn filter(
    achievements: &[Achievement],
    category: Option<AchievementCategory>,
    unlocked_only: bool,
) -> Vec<Achievement> {
    achievements
        .iter()
        .filter(|a| category.is_none_or(|c| a.category == c))
        .filter(|a| !unlocked_only || a.unlocked)
        .cloned()
        .collect()
}

/// Achievements unlocked in `after` that were not unlocked in `before`.
pub fn newly_unlocked(before: &[Achievement], after: &[Achievement]) -> Vec<Achievement> {
    after
        .iter()
        .filter(|a| a.unlocked)
        .filter(|a| !before.iter().any(|b| b.id == a.id && b.unlocked))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn stats() -> UserStats {
        UserStats {
            current_streak: 7,
            longest_streak: 9,
            total_subjects: 1,
            total_notebooks: 2,
            total_notes: 12,
            total_important_snippets: 3,
            total_revisions: 0,
            last_active: Some(datetime!(2024-05-10 09:00:00 UTC)),
        }
    }

    fn find<'a>(achievements: &'a [Achievement], id: &str) -> &'a Achievement {
        achievements.iter().find(|a| a.id == id).unwrap()
    }

    #[test]
    fn catalog_has_eleven_unique_entries() {
        assert_eq!(CATALOG.len(), 11);
        let mut ids: Vec<&str> = CATALOG.iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 11);
    }

    #[test]
    fn streak_unlocks_carry_last_active() {
        let achievements = evaluate(&stats());
        let week = find(&achievements, "streak_7");
        assert!(week.unlocked);
        assert_eq!(week.unlocked_at, stats().last_active);

        let month = find(&achievements, "streak_30");
        assert!(!month.unlocked);
        assert_eq!(month.unlocked_at, None);
        assert_eq!(month.progress, 7);
    }

    #[test]
    fn progress_is_clamped() {
        let achievements = evaluate(&stats());
        let first_note = find(&achievements, "mastery_first_note");
        assert!(first_note.unlocked);
        assert_eq!(first_note.progress, 1);
        assert_eq!(first_note.max_progress, 1);
        assert_eq!(first_note.unlocked_at, None);
    }

    #[test]
    fn filter_by_category_and_unlocked() {
        let achievements = evaluate(&stats());
        let streak = filter(&achievements, Some(AchievementCategory::Streak), false);
        assert_eq!(streak.len(), 4);

        let unlocked_streak = filter(&achievements, Some(AchievementCategory::Streak), true);
        let ids: Vec<&str> = unlocked_streak.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["streak_3", "streak_7"]);

        assert_eq!(filter(&achievements, None, false).len(), 11);
    }

    #[test]
    fn newly_unlocked_compares_snapshots() {
        let before = evaluate(&UserStats::default());
        let after = evaluate(&UserStats {
            total_subjects: 1,
            ..Default::default()
        });
        let ids: Vec<&str> = newly_unlocked(&before, &after).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["mastery_first_subject"]);
        assert!(newly_unlocked(&after, &after).is_empty());
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Mastery".parse(), Ok(AchievementCategory::Mastery));
        assert!("legend".parse::<AchievementCategory>().is_err());
    }
}
