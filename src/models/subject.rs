use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{SubjectId, UserId};

/// Color applied when a subject is created without one.
pub const DEFAULT_SUBJECT_COLOR: &str = "#3B82F6";

/// A top-level area of study that owns notebooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub description: Option<String>,
    /// Hex color string (`#RGB` or `#RRGGBB`).
    pub color: String,
    /// Single glyph shown on the subject card.
    pub icon: Option<String>,
    pub user_id: UserId,
    /// Number of notebooks owned by this subject at query time.
    pub notebook_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Payload for creating a subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewSubject {
    /// Creates a payload with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the color.
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the icon glyph.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Returns true if `color` is a `#RGB` or `#RRGGBB` hex string.
pub fn is_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_validation() {
        assert!(is_hex_color("#3B82F6"));
        assert!(is_hex_color("#fff"));
        assert!(!is_hex_color("3B82F6"));
        assert!(!is_hex_color("#3B82F"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn new_subject_deserializes_with_missing_optional_fields() {
        let payload: NewSubject = serde_json::from_str(r#"{"name":"Calculus"}"#).unwrap();
        assert_eq!(payload, NewSubject::named("Calculus"));
    }

    #[test]
    fn subject_serializes_camel_case_fields() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let subject = Subject {
            id: SubjectId::new(1),
            name: "Calculus".to_string(),
            description: None,
            color: DEFAULT_SUBJECT_COLOR.to_string(),
            icon: Some("📚".to_string()),
            user_id: UserId::from("default-user"),
            notebook_count: 0,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&subject).unwrap();
        assert_eq!(json["notebookCount"], 0);
        assert_eq!(json["userId"], "default-user");
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
    }
}
