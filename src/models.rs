mod appearance;
mod ids;
mod note;
mod notebook;
mod snippet;
mod subject;
mod user;

pub use appearance::{NoteBackground, NotebookTheme, UnknownToken};
pub use ids::{NoteId, NotebookId, SnippetId, SubjectId};
pub use note::{NewNote, Note, NoteBuilder, NoteUpdate};
pub use notebook::{NewNotebook, Notebook};
pub use snippet::{ImportantSnippet, NewSnippet};
pub use subject::{DEFAULT_SUBJECT_COLOR, NewSubject, Subject, is_hex_color};
pub use user::UserId;
