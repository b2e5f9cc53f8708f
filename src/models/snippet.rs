use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{NoteId, NotebookId, SnippetId, SubjectId, UserId};

/// A passage of a note the user marked as important.
///
/// The display fields are copies taken when the snippet was recorded and are
/// not updated when the note, notebook or subject is later renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportantSnippet {
    pub id: SnippetId,
    /// The selected text, exactly as selected.
    pub content: String,
    pub note_title: String,
    pub notebook_name: String,
    pub subject_name: String,
    pub subject_color: String,
    pub note_id: NoteId,
    pub notebook_id: NotebookId,
    pub subject_id: SubjectId,
    pub user_id: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Payload for recording a snippet. Display fields are resolved by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSnippet {
    pub content: String,
    pub note_id: NoteId,
    pub notebook_id: NotebookId,
    pub subject_id: SubjectId,
}
