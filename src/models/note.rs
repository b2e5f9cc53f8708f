use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{NoteBackground, NoteId, NotebookId, UserId};

/// A single page of rich content inside a notebook.
///
/// `content` is the serialized markup of the note document. It is stored and
/// returned verbatim; every save overwrites the whole field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub background: NoteBackground,
    pub notebook_id: NotebookId,
    pub user_id: UserId,
    /// Advisory count of snippets recorded from this note.
    ///
    /// Incremented on snippet creation only; never reconciled.
    pub important_snippet_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Payload for creating a note. The parent notebook comes from the route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub background: NoteBackground,
}

impl NewNote {
    /// Creates a payload with just a title and empty content.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sets the initial content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Partial update of a note. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub background: Option<NoteBackground>,
}

impl NoteUpdate {
    /// An update that replaces only the content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Returns true if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.background.is_none()
    }
}

/// Builder for constructing `Note` instances with optional fields.
///
/// # Examples
///
/// ```
/// use cognicanvas::{NoteBuilder, NoteId, NotebookId};
///
/// let note = NoteBuilder::new()
///     .id(NoteId::new(1))
///     .notebook_id(NotebookId::new(3))
///     .title("Limits")
///     .build();
///
/// assert_eq!(note.title, "Limits");
/// assert!(note.content.is_empty());
/// assert_eq!(note.important_snippet_count, 0);
/// ```
#[derive(Debug, Default)]
pub struct NoteBuilder {
    id: Option<NoteId>,
    title: Option<String>,
    content: Option<String>,
    background: Option<NoteBackground>,
    notebook_id: Option<NotebookId>,
    user_id: Option<UserId>,
    important_snippet_count: Option<u32>,
    created_at: Option<OffsetDateTime>,
    updated_at: Option<OffsetDateTime>,
}

impl NoteBuilder {
    /// Creates a new `NoteBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the note ID.
    pub fn id(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the note title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the serialized content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the page background.
    pub fn background(mut self, background: NoteBackground) -> Self {
        self.background = Some(background);
        self
    }

    /// Sets the parent notebook.
    pub fn notebook_id(mut self, notebook_id: NotebookId) -> Self {
        self.notebook_id = Some(notebook_id);
        self
    }

    /// Sets the owning user.
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the important snippet counter.
    pub fn important_snippet_count(mut self, count: u32) -> Self {
        self.important_snippet_count = Some(count);
        self
    }

    /// Sets the created timestamp.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the updated timestamp.
    pub fn updated_at(mut self, updated_at: OffsetDateTime) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Builds the `Note`, using defaults for optional fields.
    ///
    /// # Panics
    ///
    /// Panics if `id`, `title` or `notebook_id` have not been set.
    pub fn build(self) -> Note {
        let now = OffsetDateTime::now_utc();
        Note {
            id: self.id.expect("id is required"),
            title: self.title.expect("title is required"),
            content: self.content.unwrap_or_default(),
            background: self.background.unwrap_or_default(),
            notebook_id: self.notebook_id.expect("notebook_id is required"),
            user_id: self.user_id.unwrap_or_else(|| UserId::from("default-user")),
            important_snippet_count: self.important_snippet_count.unwrap_or(0),
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        }
    }
}
