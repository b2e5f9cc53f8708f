use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a row-id newtype.
///
/// Each id wraps a database row id to provide type safety and prevent
/// accidental mixing of subject, notebook, note and snippet ids.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates a new id from a raw row id.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the underlying row id.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }
    };
}

row_id!(
    /// Unique identifier for a subject.
    SubjectId
);
row_id!(
    /// Unique identifier for a notebook.
    NotebookId
);
row_id!(
    /// Unique identifier for a note.
    NoteId
);
row_id!(
    /// Unique identifier for an important snippet.
    SnippetId
);
