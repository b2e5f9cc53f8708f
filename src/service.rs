use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use time::OffsetDateTime;

use crate::editor::{Block, Document, EditorAction, EditorError};
use crate::error::{ServiceError, ServiceResult};
use crate::gamification::{UserStats, streaks};
use crate::utils::{day_number, from_unix_seconds, now_seconds};
use crate::{
    DEFAULT_SUBJECT_COLOR, ImportantSnippet, NewNote, NewNotebook, NewSnippet, NewSubject, Note,
    NoteBuilder, NoteId, NoteUpdate, Notebook, NotebookId, SnippetId, Subject, SubjectId, UserId,
    Database, is_hex_color,
};


/// Default cap on rows touched by one cascading delete.
pub const DEFAULT_MAX_BATCH_OPERATIONS: usize = 500;

const SUBJECT_COLUMNS: &str = "s.id, s.name, s.description, s.color, s.icon, s.user_id, \
     (SELECT COUNT(*) FROM notebooks nb WHERE nb.subject_id = s.id), s.created_at, s.updated_at";

const NOTEBOOK_COLUMNS: &str = "b.id, b.title, b.description, b.cover_image, b.theme, b.subject_id, \
     b.user_id, (SELECT COUNT(*) FROM notes n WHERE n.notebook_id = b.id), b.created_at, b.updated_at";

const NOTE_COLUMNS: &str = "id, title, content, background, notebook_id, user_id, \
     important_snippet_count, created_at, updated_at";

const SNIPPET_COLUMNS: &str = "id, content, note_title, notebook_name, subject_name, subject_color, \
     note_id, notebook_id, subject_id, user_id, created_at";

/// Row counts removed by a cascading delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    pub subjects_deleted: usize,
    pub notebooks_deleted: usize,
    pub notes_deleted: usize,
    pub snippets_deleted: usize,
    /// Ids of the removed notes, for callers holding per-note state.
    #[serde(skip)]
    pub note_ids: Vec<NoteId>,
}

impl CascadeReport {
    /// Total number of delete operations the cascade performs.
    pub fn operations(&self) -> usize {
        self.subjects_deleted + self.notebooks_deleted + self.notes_deleted + self.snippets_deleted
    }
}

/// A note together with the notebook and subject that own it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteContext {
    pub note: Note,
    pub notebook: Notebook,
    pub subject: Subject,
}

/// A subject and the most recent update anywhere beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectActivity {
    pub subject: Subject,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity: OffsetDateTime,
}

/// Persistence adapter for subjects, notebooks, notes and important snippets.
///
/// CanvasService owns a Database instance. Every operation takes the acting
/// user explicitly; rows owned by another user behave as if they did not
/// exist. This service is UI-independent and is shared by the HTTP server,
/// the CLI and the TUI.
///
/// # Examples
///
/// ```
/// use cognicanvas::{CanvasService, Database, NewSubject, UserId};
///
/// # fn main() -> anyhow::Result<()> {
/// let service = CanvasService::new(Database::in_memory()?);
/// let user = UserId::from("default-user");
///
/// let subject = service.create_subject(&user, NewSubject::named("Calculus"))?;
/// assert_eq!(subject.notebook_count, 0);
/// assert_eq!(subject.color, "#3B82F6");
/// # Ok(())
/// # }
/// ```
pub struct CanvasService {
    db: Database,
    max_batch_operations: usize,
}

impl CanvasService {
    /// Creates a new CanvasService with the given database.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            max_batch_operations: DEFAULT_MAX_BATCH_OPERATIONS,
        }
    }

    /// Sets the cascading delete limit.
    pub fn with_max_batch_operations(mut self, limit: usize) -> Self {
        self.max_batch_operations = limit;
        self
    }

    /// Returns a reference to the underlying database.
    ///
    /// Useful for testing or advanced operations that need direct database access.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn max_batch_operations(&self) -> usize {
        self.max_batch_operations
    }

    // ---------------------------------------------------------------------
    // Subjects
    // ---------------------------------------------------------------------

    /// Creates a subject. A missing color falls back to
    /// [`DEFAULT_SUBJECT_COLOR`].
    ///
    /// # Errors
    ///
    /// `Validation` for an empty name or a color that is not `#RGB`/`#RRGGBB`.
    pub fn create_subject(&self, user: &UserId, new: NewSubject) -> ServiceResult<Subject> {
        check_user(user)?;
        let name = required(&new.name, "Subject name")?;
        let color = match optional(new.color) {
            Some(color) if is_hex_color(&color) => color,
            Some(color) => {
                return Err(ServiceError::validation(format!(
                    "Invalid color '{color}': expected #RGB or #RRGGBB"
                )));
            }
            None => DEFAULT_SUBJECT_COLOR.to_string(),
        };

        let conn = self.db.connection();
        let now = now_seconds();
        conn.execute(
            "INSERT INTO subjects (user_id, name, description, color, icon, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                user.as_str(),
                name,
                optional(new.description),
                color,
                optional(new.icon),
                now
            ],
        )?;
        let id = SubjectId::new(conn.last_insert_rowid());
        tracing::info!(subject_id = %id, user = %user, "created subject");

        self.get_subject(user, id)?
            .ok_or_else(|| ServiceError::not_found("subject", id.get()))
    }

    /// Lists the user's subjects, newest first.
    pub fn list_subjects(&self, user: &UserId) -> ServiceResult<Vec<Subject>> {
        let sql = format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects s
             WHERE s.user_id = ?1
             ORDER BY s.created_at DESC, s.id DESC"
        );
        let mut stmt = self.db.connection().prepare(&sql)?;
        let subjects = stmt
            .query_map([user.as_str()], subject_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }

    /// Retrieves a subject by id. Returns `None` if it does not exist or
    /// belongs to another user.
    pub fn get_subject(&self, user: &UserId, id: SubjectId) -> ServiceResult<Option<Subject>> {
        Ok(find_subject(self.db.connection(), user, id)?)
    }

    /// Deletes a subject with its notebooks, their notes and every important
    /// snippet that references them, in one transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` when the subject is absent. `BatchLimitExceeded` when the
    /// cascade would exceed the configured limit; nothing is deleted then.
    pub fn delete_subject(
        &self,
        user: &UserId,
        id: SubjectId,
    ) -> ServiceResult<(Subject, CascadeReport)> {
        check_user(user)?;
        let tx = self.db.connection().unchecked_transaction()?;

        let subject =
            find_subject(&tx, user, id)?.ok_or_else(|| ServiceError::not_found("subject", id.get()))?;

        let notebook_ids = row_ids(&tx, "SELECT id FROM notebooks WHERE subject_id = ?1", id.get())?;
        let note_ids = row_ids(
            &tx,
            "SELECT id FROM notes WHERE notebook_id IN (SELECT id FROM notebooks WHERE subject_id = ?1)",
            id.get(),
        )?;
        let snippet_filter = "subject_id = ?1
             OR notebook_id IN (SELECT id FROM notebooks WHERE subject_id = ?1)";
        let snippets_deleted = count(
            &tx,
            &format!("SELECT COUNT(*) FROM important_snippets WHERE {snippet_filter}"),
            id.get(),
        )?;

        let report = CascadeReport {
            subjects_deleted: 1,
            notebooks_deleted: notebook_ids.len(),
            notes_deleted: note_ids.len(),
            snippets_deleted,
            note_ids: note_ids.into_iter().map(NoteId::new).collect(),
        };
        self.check_batch(&report)?;

        tx.execute(
            &format!("DELETE FROM important_snippets WHERE {snippet_filter}"),
            [id.get()],
        )?;
        tx.execute(
            "DELETE FROM notes WHERE notebook_id IN (SELECT id FROM notebooks WHERE subject_id = ?1)",
            [id.get()],
        )?;
        tx.execute("DELETE FROM notebooks WHERE subject_id = ?1", [id.get()])?;
        tx.execute("DELETE FROM subjects WHERE id = ?1", [id.get()])?;
        tx.commit()?;

        tracing::info!(
            subject_id = %id,
            notebooks = report.notebooks_deleted,
            notes = report.notes_deleted,
            snippets = report.snippets_deleted,
            "deleted subject"
        );
        Ok((subject, report))
    }

    // ---------------------------------------------------------------------
    // Notebooks
    // ---------------------------------------------------------------------

    /// Creates a notebook inside a subject.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty title, `NotFound` for an unknown subject.
    pub fn create_notebook(
        &self,
        user: &UserId,
        subject_id: SubjectId,
        new: NewNotebook,
    ) -> ServiceResult<Notebook> {
        check_user(user)?;
        let title = required(&new.title, "Notebook title")?;
        if self.get_subject(user, subject_id)?.is_none() {
            return Err(ServiceError::not_found("subject", subject_id.get()));
        }

        let conn = self.db.connection();
        let now = now_seconds();
        conn.execute(
            "INSERT INTO notebooks
                (user_id, subject_id, title, description, cover_image, theme, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                user.as_str(),
                subject_id,
                title,
                optional(new.description),
                optional(new.cover_image),
                new.theme,
                now
            ],
        )?;
        let id = NotebookId::new(conn.last_insert_rowid());
        tracing::info!(notebook_id = %id, subject_id = %subject_id, "created notebook");

        self.get_notebook(user, id)?
            .ok_or_else(|| ServiceError::not_found("notebook", id.get()))
    }

    /// Lists a subject's notebooks, newest first. An unknown subject yields
    /// an empty list.
    pub fn list_notebooks(&self, user: &UserId, subject_id: SubjectId) -> ServiceResult<Vec<Notebook>> {
        let sql = format!(
            "SELECT {NOTEBOOK_COLUMNS} FROM notebooks b
             WHERE b.subject_id = ?1 AND b.user_id = ?2
             ORDER BY b.created_at DESC, b.id DESC"
        );
        let mut stmt = self.db.connection().prepare(&sql)?;
        let notebooks = stmt
            .query_map(params![subject_id, user.as_str()], notebook_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notebooks)
    }

    pub fn get_notebook(&self, user: &UserId, id: NotebookId) -> ServiceResult<Option<Notebook>> {
        Ok(find_notebook(self.db.connection(), user, id)?)
    }

    /// Deletes a notebook with its notes and their important snippets.
    ///
    /// Same transaction and batch-limit rules as
    /// [`delete_subject`](Self::delete_subject).
    pub fn delete_notebook(
        &self,
        user: &UserId,
        id: NotebookId,
    ) -> ServiceResult<(Notebook, CascadeReport)> {
        check_user(user)?;
        let tx = self.db.connection().unchecked_transaction()?;

        let notebook = find_notebook(&tx, user, id)?
            .ok_or_else(|| ServiceError::not_found("notebook", id.get()))?;

        let note_ids = row_ids(&tx, "SELECT id FROM notes WHERE notebook_id = ?1", id.get())?;
        let snippet_filter =
            "notebook_id = ?1 OR note_id IN (SELECT id FROM notes WHERE notebook_id = ?1)";
        let snippets_deleted = count(
            &tx,
            &format!("SELECT COUNT(*) FROM important_snippets WHERE {snippet_filter}"),
            id.get(),
        )?;

        let report = CascadeReport {
            subjects_deleted: 0,
            notebooks_deleted: 1,
            notes_deleted: note_ids.len(),
            snippets_deleted,
            note_ids: note_ids.into_iter().map(NoteId::new).collect(),
        };
        self.check_batch(&report)?;

        tx.execute(
            &format!("DELETE FROM important_snippets WHERE {snippet_filter}"),
            [id.get()],
        )?;
        tx.execute("DELETE FROM notes WHERE notebook_id = ?1", [id.get()])?;
        tx.execute("DELETE FROM notebooks WHERE id = ?1", [id.get()])?;
        tx.commit()?;

        tracing::info!(
            notebook_id = %id,
            notes = report.notes_deleted,
            snippets = report.snippets_deleted,
            "deleted notebook"
        );
        Ok((notebook, report))
    }

    // ---------------------------------------------------------------------
    // Notes
    // ---------------------------------------------------------------------

    /// Creates a note inside a notebook and marks the notebook as updated.
    ///
    /// The content string is stored verbatim.
    pub fn create_note(&self, user: &UserId, notebook_id: NotebookId, new: NewNote) -> ServiceResult<Note> {
        check_user(user)?;
        let title = required(&new.title, "Note title")?;
        if self.get_notebook(user, notebook_id)?.is_none() {
            return Err(ServiceError::not_found("notebook", notebook_id.get()));
        }

        let tx = self.db.connection().unchecked_transaction()?;
        let now = now_seconds();
        tx.execute(
            "INSERT INTO notes (user_id, notebook_id, title, content, background, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![user.as_str(), notebook_id, title, new.content, new.background, now],
        )?;
        let id = NoteId::new(tx.last_insert_rowid());
        tx.execute(
            "UPDATE notebooks SET updated_at = ?1 WHERE id = ?2",
            params![now, notebook_id],
        )?;
        tx.commit()?;
        tracing::info!(note_id = %id, notebook_id = %notebook_id, "created note");

        self.get_note(user, id)?
            .ok_or_else(|| ServiceError::not_found("note", id.get()))
    }

    /// Lists a notebook's notes, newest first. An unknown notebook yields an
    /// empty list.
    pub fn list_notes(&self, user: &UserId, notebook_id: NotebookId) -> ServiceResult<Vec<Note>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             WHERE notebook_id = ?1 AND user_id = ?2
             ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = self.db.connection().prepare(&sql)?;
        let notes = stmt
            .query_map(params![notebook_id, user.as_str()], note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    pub fn get_note(&self, user: &UserId, id: NoteId) -> ServiceResult<Option<Note>> {
        Ok(find_note(self.db.connection(), user, id)?)
    }

    /// Overwrites the supplied fields and bumps `updated_at`.
    ///
    /// An update with no fields is a no-op that returns the stored note.
    ///
    /// # Errors
    ///
    /// `Validation` for a supplied empty title, `NotFound` for an unknown note.
    pub fn update_note(&self, user: &UserId, id: NoteId, update: NoteUpdate) -> ServiceResult<Note> {
        check_user(user)?;
        if update.is_empty() {
            return self
                .get_note(user, id)?
                .ok_or_else(|| ServiceError::not_found("note", id.get()));
        }
        let title = update
            .title
            .as_deref()
            .map(|title| required(title, "Note title"))
            .transpose()?;

        let changed = self.db.connection().execute(
            "UPDATE notes SET
                title = COALESCE(?1, title),
                content = COALESCE(?2, content),
                background = COALESCE(?3, background),
                updated_at = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![
                title,
                update.content,
                update.background,
                now_seconds(),
                id,
                user.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(ServiceError::not_found("note", id.get()));
        }
        tracing::debug!(note_id = %id, "updated note");

        self.get_note(user, id)?
            .ok_or_else(|| ServiceError::not_found("note", id.get()))
    }

    /// Deletes a note and its important snippets.
    pub fn delete_note(&self, user: &UserId, id: NoteId) -> ServiceResult<(Note, CascadeReport)> {
        check_user(user)?;
        let tx = self.db.connection().unchecked_transaction()?;

        let note = find_note(&tx, user, id)?.ok_or_else(|| ServiceError::not_found("note", id.get()))?;
        let snippets_deleted = count(
            &tx,
            "SELECT COUNT(*) FROM important_snippets WHERE note_id = ?1",
            id.get(),
        )?;
        let report = CascadeReport {
            notes_deleted: 1,
            snippets_deleted,
            note_ids: vec![id],
            ..Default::default()
        };
        self.check_batch(&report)?;

        tx.execute("DELETE FROM important_snippets WHERE note_id = ?1", [id.get()])?;
        tx.execute("DELETE FROM notes WHERE id = ?1", [id.get()])?;
        tx.commit()?;

        tracing::info!(note_id = %id, snippets = snippets_deleted, "deleted note");
        Ok((note, report))
    }

    // ---------------------------------------------------------------------
    // Important snippets
    // ---------------------------------------------------------------------

    /// Records an important snippet.
    ///
    /// The display fields are copied from the owning note, notebook and
    /// subject at call time. After the insert the note's
    /// `important_snippet_count` is incremented and its `updated_at` bumped in
    /// a separate best-effort statement; a failure there is logged and does
    /// not fail the call.
    ///
    /// # Errors
    ///
    /// `Validation` for whitespace-only content or ids that do not form one
    /// note → notebook → subject chain, `NotFound` for an unknown note.
    pub fn create_snippet(&self, user: &UserId, new: NewSnippet) -> ServiceResult<ImportantSnippet> {
        check_user(user)?;
        if new.content.trim().is_empty() {
            return Err(ServiceError::validation("Snippet content is required"));
        }
        let context = self.note_context(user, new.note_id)?;
        if context.notebook.id != new.notebook_id || context.subject.id != new.subject_id {
            return Err(ServiceError::validation(
                "Snippet notebook and subject must match the note's",
            ));
        }

        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO important_snippets
                (user_id, content, note_id, notebook_id, subject_id,
                 note_title, notebook_name, subject_name, subject_color, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user.as_str(),
                new.content,
                new.note_id,
                new.notebook_id,
                new.subject_id,
                context.note.title,
                context.notebook.title,
                context.subject.name,
                context.subject.color,
                now_seconds()
            ],
        )?;
        let id = SnippetId::new(conn.last_insert_rowid());
        tracing::info!(snippet_id = %id, note_id = %new.note_id, "recorded important snippet");

        if let Err(err) = conn.execute(
            "UPDATE notes
             SET important_snippet_count = important_snippet_count + 1, updated_at = ?2
             WHERE id = ?1",
            params![new.note_id, now_seconds()],
        ) {
            tracing::warn!(note_id = %new.note_id, error = %err, "failed to increment important snippet count");
        }

        let sql = format!("SELECT {SNIPPET_COLUMNS} FROM important_snippets WHERE id = ?1");
        Ok(conn.query_row(&sql, [id], snippet_from_row)?)
    }

    /// Lists the user's snippets, newest first, optionally for one subject.
    pub fn list_snippets(
        &self,
        user: &UserId,
        subject_id: Option<SubjectId>,
    ) -> ServiceResult<Vec<ImportantSnippet>> {
        let mut sql = format!("SELECT {SNIPPET_COLUMNS} FROM important_snippets WHERE user_id = ?1");
        if subject_id.is_some() {
            sql.push_str(" AND subject_id = ?2");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.db.connection().prepare(&sql)?;
        let snippets = match subject_id {
            Some(subject_id) => stmt
                .query_map(params![user.as_str(), subject_id], snippet_from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([user.as_str()], snippet_from_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(snippets)
    }

    // ---------------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------------

    /// Loads a note with its notebook and subject.
    pub fn note_context(&self, user: &UserId, note_id: NoteId) -> ServiceResult<NoteContext> {
        let conn = self.db.connection();
        let note = find_note(conn, user, note_id)?
            .ok_or_else(|| ServiceError::not_found("note", note_id.get()))?;
        let notebook = find_notebook(conn, user, note.notebook_id)?
            .ok_or_else(|| ServiceError::not_found("notebook", note.notebook_id.get()))?;
        let subject = find_subject(conn, user, notebook.subject_id)?
            .ok_or_else(|| ServiceError::not_found("subject", notebook.subject_id.get()))?;
        Ok(NoteContext {
            note,
            notebook,
            subject,
        })
    }

    /// Inserts a block after the caret block (or appends) and saves the note.
    ///
    /// Returns the saved note and the index the block landed at.
    pub fn insert_block(
        &self,
        user: &UserId,
        note_id: NoteId,
        caret: Option<usize>,
        block: Block,
    ) -> ServiceResult<(Note, usize)> {
        if let Block::Heading { level, .. } = &block
            && !(1..=3).contains(level)
        {
            return Err(EditorError::InvalidHeadingLevel(*level).into());
        }
        let note = self
            .get_note(user, note_id)?
            .ok_or_else(|| ServiceError::not_found("note", note_id.get()))?;

        let mut doc = Document::parse(&note.content);
        let index = doc.insert(caret, block);
        let note = self.update_note(user, note_id, NoteUpdate::content(doc.to_html()))?;
        Ok((note, index))
    }

    /// Applies an interactive control to a block and saves the note.
    pub fn apply_action(
        &self,
        user: &UserId,
        note_id: NoteId,
        block: usize,
        action: EditorAction,
    ) -> ServiceResult<Note> {
        let note = self
            .get_note(user, note_id)?
            .ok_or_else(|| ServiceError::not_found("note", note_id.get()))?;

        let mut doc = Document::parse(&note.content);
        doc.apply(block, action)?;
        tracing::debug!(note_id = %note_id, block, action = action.name(), "applied editor action");
        self.update_note(user, note_id, NoteUpdate::content(doc.to_html()))
    }

    // ---------------------------------------------------------------------
    // Activity
    // ---------------------------------------------------------------------

    /// Computes totals and daily streaks for a user as of `now`.
    ///
    /// A day counts as active when a note was created or updated on it.
    /// `total_revisions` is left at zero; revisions are tracked in memory by
    /// [`RevisionPlanner`](crate::gamification::RevisionPlanner).
    pub fn user_stats(&self, user: &UserId, now: OffsetDateTime) -> ServiceResult<UserStats> {
        let conn = self.db.connection();
        let total = |table: &str| -> ServiceResult<u32> {
            Ok(conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE user_id = ?1"),
                [user.as_str()],
                |row| row.get(0),
            )?)
        };

        let mut stmt = conn.prepare(
            "SELECT created_at FROM notes WHERE user_id = ?1
             UNION
             SELECT updated_at FROM notes WHERE user_id = ?1",
        )?;
        let mut active_days = Vec::new();
        for seconds in stmt.query_map([user.as_str()], |row| row.get::<_, i64>(0))? {
            active_days.push(day_number(from_unix_seconds(seconds?)?));
        }
        let (current_streak, longest_streak) = streaks(&active_days, day_number(now));

        let last_active: Option<i64> = conn.query_row(
            "SELECT MAX(updated_at) FROM notes WHERE user_id = ?1",
            [user.as_str()],
            |row| row.get(0),
        )?;

        Ok(UserStats {
            current_streak,
            longest_streak,
            total_subjects: total("subjects")?,
            total_notebooks: total("notebooks")?,
            total_notes: total("notes")?,
            total_important_snippets: total("important_snippets")?,
            total_revisions: 0,
            last_active: last_active.map(from_unix_seconds).transpose()?,
        })
    }

    /// Lists each subject with the latest update to it, its notebooks or
    /// their notes.
    pub fn subject_activity(&self, user: &UserId) -> ServiceResult<Vec<SubjectActivity>> {
        let sql = format!(
            "SELECT {SUBJECT_COLUMNS},
                MAX(
                    s.updated_at,
                    COALESCE((SELECT MAX(b.updated_at) FROM notebooks b WHERE b.subject_id = s.id), 0),
                    COALESCE((SELECT MAX(n.updated_at) FROM notes n
                              JOIN notebooks b ON n.notebook_id = b.id
                              WHERE b.subject_id = s.id), 0)
                )
             FROM subjects s
             WHERE s.user_id = ?1
             ORDER BY s.created_at DESC, s.id DESC"
        );
        let mut stmt = self.db.connection().prepare(&sql)?;
        let activity = stmt
            .query_map([user.as_str()], |row| {
                Ok(SubjectActivity {
                    subject: subject_from_row(row)?,
                    last_activity: timestamp(row, 9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(activity)
    }

    fn check_batch(&self, report: &CascadeReport) -> ServiceResult<()> {
        let operations = report.operations();
        if operations > self.max_batch_operations {
            tracing::warn!(
                operations,
                limit = self.max_batch_operations,
                "cascading delete refused"
            );
            return Err(ServiceError::BatchLimitExceeded {
                operations,
                limit: self.max_batch_operations,
            });
        }
        Ok(())
    }
}

fn check_user(user: &UserId) -> ServiceResult<()> {
    if user.is_empty() {
        return Err(ServiceError::validation("User id is required"));
    }
    Ok(())
}

/// Trimmed value, or a validation error naming the field.
fn required(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trimmed value, with blank strings treated as absent.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn row_ids(conn: &Connection, sql: &str, parent: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([parent], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn count(conn: &Connection, sql: &str, parent: i64) -> rusqlite::Result<usize> {
    let n: i64 = conn.query_row(sql, [parent], |row| row.get(0))?;
    Ok(usize::try_from(n).unwrap_or_default())
}

fn find_subject(conn: &Connection, user: &UserId, id: SubjectId) -> rusqlite::Result<Option<Subject>> {
    let sql = format!("SELECT {SUBJECT_COLUMNS} FROM subjects s WHERE s.id = ?1 AND s.user_id = ?2");
    conn.query_row(&sql, params![id, user.as_str()], subject_from_row)
        .optional()
}

fn find_notebook(conn: &Connection, user: &UserId, id: NotebookId) -> rusqlite::Result<Option<Notebook>> {
    let sql = format!("SELECT {NOTEBOOK_COLUMNS} FROM notebooks b WHERE b.id = ?1 AND b.user_id = ?2");
    conn.query_row(&sql, params![id, user.as_str()], notebook_from_row)
        .optional()
}

fn find_note(conn: &Connection, user: &UserId, id: NoteId) -> rusqlite::Result<Option<Note>> {
    let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND user_id = ?2");
    conn.query_row(&sql, params![id, user.as_str()], note_from_row)
        .optional()
}

/// Reads a Unix-seconds column as a UTC timestamp.
fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let seconds: i64 = row.get(idx)?;
    from_unix_seconds(seconds)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err)))
}

fn subject_from_row(row: &Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
        user_id: UserId::new(row.get::<_, String>(5)?),
        notebook_count: row.get(6)?,
        created_at: timestamp(row, 7)?,
        updated_at: timestamp(row, 8)?,
    })
}

fn notebook_from_row(row: &Row<'_>) -> rusqlite::Result<Notebook> {
    Ok(Notebook {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        cover_image: row.get(3)?,
        theme: row.get(4)?,
        subject_id: row.get(5)?,
        user_id: UserId::new(row.get::<_, String>(6)?),
        note_count: row.get(7)?,
        created_at: timestamp(row, 8)?,
        updated_at: timestamp(row, 9)?,
    })
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(NoteBuilder::new()
        .id(row.get(0)?)
        .title(row.get::<_, String>(1)?)
        .content(row.get::<_, String>(2)?)
        .background(row.get(3)?)
        .notebook_id(row.get(4)?)
        .user_id(UserId::new(row.get::<_, String>(5)?))
        .important_snippet_count(row.get(6)?)
        .created_at(timestamp(row, 7)?)
        .updated_at(timestamp(row, 8)?)
        .build())
}

fn snippet_from_row(row: &Row<'_>) -> rusqlite::Result<ImportantSnippet> {
    Ok(ImportantSnippet {
        id: row.get(0)?,
        content: row.get(1)?,
        note_title: row.get(2)?,
        notebook_name: row.get(3)?,
        subject_name: row.get(4)?,
        subject_color: row.get(5)?,
        note_id: row.get(6)?,
        notebook_id: row.get(7)?,
        subject_id: row.get(8)?,
        user_id: UserId::new(row.get::<_, String>(9)?),
        created_at: timestamp(row, 10)?,
    })
}
