use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{NotebookId, NotebookTheme, SubjectId, UserId};

/// A collection of notes inside a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: NotebookId,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub theme: NotebookTheme,
    pub subject_id: SubjectId,
    pub user_id: UserId,
    /// Number of notes in this notebook at query time.
    pub note_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Payload for creating a notebook. The parent subject comes from the route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotebook {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub theme: NotebookTheme,
}

impl NewNotebook {
    /// Creates a payload with just a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sets the theme.
    pub fn theme(mut self, theme: NotebookTheme) -> Self {
        self.theme = theme;
        self
    }
}
