//! Subjects, notebooks, notes, editing and snippets.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiJson, AppState, CurrentUser};
use crate::editor::{Block, EditorAction, Selection};
use crate::error::ServiceError;
use crate::highlight::{self, HighlightOutcome};
use crate::{
    CascadeReport, ImportantSnippet, NewNote, NewNotebook, NewSnippet, NewSubject, Note, NoteId, NoteUpdate,
    Notebook, NotebookId, Subject, SubjectId, UserId,
};

type Created<T> = (StatusCode, Json<T>);

fn created<T>(value: T) -> Created<T> {
    (StatusCode::CREATED, Json(value))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDeleted {
    message: &'static str,
    subject: Subject,
    notebooks_deleted: usize,
    notes_deleted: usize,
    snippets_deleted: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookDeleted {
    message: &'static str,
    notebook: Notebook,
    notes_deleted: usize,
    snippets_deleted: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDeleted {
    message: &'static str,
    note: Note,
    snippets_deleted: usize,
}

/// Drops revision state held for notes a delete removed.
fn forget_notes(state: &AppState, user: &UserId, report: &CascadeReport) -> Result<(), ApiError> {
    state.with_planner(|planner| {
        for note_id in &report.note_ids {
            planner.forget_note(user, *note_id);
        }
    })
}

pub async fn list_subjects(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Subject>>, ApiError> {
    let subjects = state
        .with_service("fetch subjects", move |s| s.list_subjects(&user))
        .await?;
    Ok(Json(subjects))
}

pub async fn create_subject(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<NewSubject>,
) -> Result<Created<Subject>, ApiError> {
    let subject = state
        .with_service("create subject", move |s| s.create_subject(&user, payload))
        .await?;
    Ok(created(subject))
}

pub async fn delete_subject(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<SubjectDeleted>, ApiError> {
    let owner = user.clone();
    let (subject, report) = state
        .with_service("delete subject", move |s| {
            s.delete_subject(&owner, SubjectId::new(id))
        })
        .await?;
    forget_notes(&state, &user, &report)?;
    Ok(Json(SubjectDeleted {
        message: "Subject deleted successfully",
        subject,
        notebooks_deleted: report.notebooks_deleted,
        notes_deleted: report.notes_deleted,
        snippets_deleted: report.snippets_deleted,
    }))
}

pub async fn list_notebooks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Notebook>>, ApiError> {
    let notebooks = state
        .with_service("fetch notebooks", move |s| {
            s.list_notebooks(&user, SubjectId::new(id))
        })
        .await?;
    Ok(Json(notebooks))
}

pub async fn create_notebook(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<NewNotebook>,
) -> Result<Created<Notebook>, ApiError> {
    let notebook = state
        .with_service("create notebook", move |s| {
            s.create_notebook(&user, SubjectId::new(id), payload)
        })
        .await?;
    Ok(created(notebook))
}

pub async fn delete_notebook(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<NotebookDeleted>, ApiError> {
    let owner = user.clone();
    let (notebook, report) = state
        .with_service("delete notebook", move |s| {
            s.delete_notebook(&owner, NotebookId::new(id))
        })
        .await?;
    forget_notes(&state, &user, &report)?;
    Ok(Json(NotebookDeleted {
        message: "Notebook deleted successfully",
        notebook,
        notes_deleted: report.notes_deleted,
        snippets_deleted: report.snippets_deleted,
    }))
}

pub async fn list_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state
        .with_service("fetch notes", move |s| {
            s.list_notes(&user, NotebookId::new(id))
        })
        .await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<NewNote>,
) -> Result<Created<Note>, ApiError> {
    let note = state
        .with_service("create note", move |s| {
            s.create_note(&user, NotebookId::new(id), payload)
        })
        .await?;
    Ok(created(note))
}

pub async fn get_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Note>, ApiError> {
    let note_id = NoteId::new(id);
    state
        .with_service("fetch note", move |s| {
            s.get_note(&user, note_id)?
                .ok_or_else(|| ServiceError::not_found("note", note_id.get()))
        })
        .await
        .map(Json)
}

pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<NoteUpdate>,
) -> Result<Json<Note>, ApiError> {
    state
        .with_service("update note", move |s| {
            s.update_note(&user, NoteId::new(id), update)
        })
        .await
        .map(Json)
}

pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<NoteDeleted>, ApiError> {
    let owner = user.clone();
    let (note, report) = state
        .with_service("delete note", move |s| s.delete_note(&owner, NoteId::new(id)))
        .await?;
    forget_notes(&state, &user, &report)?;
    Ok(Json(NoteDeleted {
        message: "Note deleted successfully",
        note,
        snippets_deleted: report.snippets_deleted,
    }))
}

#[derive(Debug, Deserialize)]
pub struct InsertBlockRequest {
    block: Block,
    /// Index of the block holding the caret; the new block goes after it.
    #[serde(default)]
    at: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct BlockInserted {
    note: Note,
    index: usize,
}

pub async fn insert_block(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<InsertBlockRequest>,
) -> Result<Json<BlockInserted>, ApiError> {
    let (note, index) = state
        .with_service("insert block", move |s| {
            s.insert_block(&user, NoteId::new(id), request.at, request.block)
        })
        .await?;
    Ok(Json(BlockInserted { note, index }))
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    block: usize,
    #[serde(flatten)]
    action: EditorAction,
}

pub async fn apply_action(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<ActionRequest>,
) -> Result<Json<Note>, ApiError> {
    state
        .with_service("apply action", move |s| {
            s.apply_action(&user, NoteId::new(id), request.block, request.action)
        })
        .await
        .map(Json)
}

pub async fn mark_important(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(selection): ApiJson<Selection>,
) -> Result<Created<HighlightOutcome>, ApiError> {
    let outcome = state
        .with_service("save important snippet", move |s| {
            highlight::mark_important(s, &user, NoteId::new(id), selection)
        })
        .await?;
    Ok(created(outcome))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetQuery {
    subject_id: Option<i64>,
}

pub async fn list_snippets(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SnippetQuery>,
) -> Result<Json<Vec<ImportantSnippet>>, ApiError> {
    let subject = query.subject_id.map(SubjectId::new);
    state
        .with_service("fetch important snippets", move |s| {
            s.list_snippets(&user, subject)
        })
        .await
        .map(Json)
}

/// Body of `POST /api/important-snippets`. Fields are optional here so an
/// incomplete body is reported as one validation error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetRequest {
    content: Option<String>,
    note_id: Option<i64>,
    notebook_id: Option<i64>,
    subject_id: Option<i64>,
}

impl SnippetRequest {
    fn into_new_snippet(self) -> Result<NewSnippet, ApiError> {
        match (self.content, self.note_id, self.notebook_id, self.subject_id) {
            (Some(content), Some(note_id), Some(notebook_id), Some(subject_id))
                if !content.is_empty() =>
            {
                Ok(NewSnippet {
                    content,
                    note_id: NoteId::new(note_id),
                    notebook_id: NotebookId::new(notebook_id),
                    subject_id: SubjectId::new(subject_id),
                })
            }
            _ => Err(ApiError::bad_request("Missing required fields")),
        }
    }
}

pub async fn create_snippet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<SnippetRequest>,
) -> Result<Created<ImportantSnippet>, ApiError> {
    let payload = request.into_new_snippet()?;
    let snippet = state
        .with_service("save important snippet", move |s| {
            s.create_snippet(&user, payload)
        })
        .await?;
    Ok(created(snippet))
}
