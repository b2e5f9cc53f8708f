pub mod chat;
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod gamification;
pub mod highlight;
pub mod models;
pub mod server;
pub mod service;
pub mod tui;
pub mod utils;
pub mod views;

pub use db::Database;
pub use error::{ServiceError, ServiceResult};
pub use models::{
    DEFAULT_SUBJECT_COLOR, ImportantSnippet, NewNote, NewNotebook, NewSnippet, NewSubject, Note,
    NoteBackground, NoteBuilder, NoteId, NoteUpdate, Notebook, NotebookId, NotebookTheme,
    SnippetId, Subject, SubjectId, UserId, is_hex_color,
};
pub use service::{
    CanvasService, CascadeReport, DEFAULT_MAX_BATCH_OPERATIONS, NoteContext, SubjectActivity,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_accessible_from_crate_root() {
        let db = Database::in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn types_accessible_from_crate_root() {
        let note = NoteBuilder::new()
            .id(NoteId::new(1))
            .notebook_id(NotebookId::new(1))
            .title("test")
            .content("<p>test</p>")
            .build();
        assert_eq!(note.content, "<p>test</p>");
        assert_eq!(note.background, NoteBackground::default());

        let subject = NewSubject::named("Physics");
        assert_eq!(subject.name, "Physics");
        assert!(is_hex_color(DEFAULT_SUBJECT_COLOR));
    }

    #[test]
    fn service_accessible_from_crate_root() {
        let service = CanvasService::new(Database::in_memory().unwrap());
        assert_eq!(service.max_batch_operations(), DEFAULT_MAX_BATCH_OPERATIONS);
        assert_eq!(CascadeReport::default().operations(), 0);
    }
}
