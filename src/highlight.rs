//! Marking a selection inside a note as important.

use serde::Serialize;

use crate::editor::{Document, Selection};
use crate::error::ServiceResult;
use crate::{CanvasService, ImportantSnippet, NewSnippet, Note, NoteId, NoteUpdate, UserId};

/// Result of [`mark_important`]: the recorded snippet and the re-saved note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightOutcome {
    pub snippet: ImportantSnippet,
    pub note: Note,
}

/// Records the selected text as an important snippet, then highlights it in
/// the note.
///
/// The snippet is persisted first; the document is only re-saved with the
/// highlight after that succeeds. A whitespace-only selection is rejected
/// before anything is written.
pub fn mark_important(
    service: &CanvasService,
    user: &UserId,
    note_id: NoteId,
    selection: Selection,
) -> ServiceResult<HighlightOutcome> {
    let context = service.note_context(user, note_id)?;
    let mut doc = Document::parse(&context.note.content);
    let text = doc.selected_text(&selection)?;

    let snippet = service.create_snippet(
        user,
        NewSnippet {
            content: text,
            note_id,
            notebook_id: context.notebook.id,
            subject_id: context.subject.id,
        },
    )?;

    doc.highlight(&selection)?;
    let note = service.update_note(user, note_id, NoteUpdate::content(doc.to_html()))?;
    tracing::debug!(note_id = %note_id, snippet_id = %snippet.id, "highlighted selection");

    Ok(HighlightOutcome { snippet, note })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorError;
    use crate::error::ServiceError;
    use crate::{Database, NewNote, NewNotebook, NewSubject};

    fn setup(content: &str) -> (CanvasService, UserId, Note) {
        let service = CanvasService::new(Database::in_memory().unwrap());
        let user = UserId::from("default-user");
        let subject = service
            .create_subject(&user, NewSubject::named("Calculus"))
            .unwrap();
        let notebook = service
            .create_notebook(&user, subject.id, NewNotebook::titled("Chapter 1"))
            .unwrap();
        let note = service
            .create_note(&user, notebook.id, NewNote::titled("Limits").content(content))
            .unwrap();
        (service, user, note)
    }

    #[test]
    fn marks_selection_and_records_snippet() {
        let (service, user, note) = setup("<p>We say a limit exists when</p>");

        let outcome = mark_important(&service, &user, note.id, Selection::new(0, 9, 21)).unwrap();

        assert_eq!(outcome.snippet.content, "limit exists");
        assert_eq!(outcome.snippet.note_title, "Limits");
        assert_eq!(
            outcome.note.content,
            r#"<p>We say a <mark class="important">limit exists</mark> when</p>"#
        );
        assert_eq!(outcome.note.important_snippet_count, 1);
    }

    #[test]
    fn whitespace_selection_writes_nothing() {
        let (service, user, note) = setup("<p>a   b</p>");

        let err = mark_important(&service, &user, note.id, Selection::new(0, 1, 4)).unwrap_err();

        assert!(matches!(err, ServiceError::Editor(EditorError::EmptySelection)));
        assert!(service.list_snippets(&user, None).unwrap().is_empty());
        let stored = service.get_note(&user, note.id).unwrap().unwrap();
        assert_eq!(stored.content, "<p>a   b</p>");
    }

    #[test]
    fn unknown_note_is_not_found() {
        let (service, user, _) = setup("");
        let err = mark_important(&service, &user, NoteId::new(404), Selection::new(0, 0, 1))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "note", .. }));
    }

    #[test]
    fn raw_content_cannot_be_selected() {
        let (service, user, note) = setup("<p>unclosed");
        let err = mark_important(&service, &user, note.id, Selection::new(0, 0, 3)).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Editor(EditorError::NotTextual { kind: "raw" })
        ));
    }
}
