/// End-to-end tests of the HTTP API against an in-memory database.
///
/// Requests go through the full router with `tower::ServiceExt::oneshot`, so
/// routing, extractors and error mapping are all exercised.
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use cognicanvas::chat::{ChatClientTrait, ChatError};
use cognicanvas::server::{self, AppState, USER_HEADER};
use cognicanvas::{CanvasService, Database, UserId};
use serde_json::{Value, json};
use tower::ServiceExt;

struct FakeChat;

impl ChatClientTrait for FakeChat {
    fn complete(&self, message: &str) -> Result<String, ChatError> {
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        Ok(format!("You asked about {message}"))
    }
}

fn app_with_limit(limit: usize) -> Router {
    let db = Database::in_memory().expect("failed to create in-memory database");
    let service = CanvasService::new(db).with_max_batch_operations(limit);
    let state = AppState::new(service, Arc::new(FakeChat), UserId::from("default-user"));
    server::router(state)
}

fn app() -> Router {
    app_with_limit(500)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_as(app, None, method, uri, body).await
}

async fn send_as(
    app: &Router,
    user: Option<&str>,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(USER_HEADER, user);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Creates subject, notebook and note; returns their ids.
async fn seed(app: &Router, content: &str) -> (i64, i64, i64) {
    let (status, subject) = send(app, "POST", "/api/subjects", Some(json!({ "name": "Calculus" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let subject_id = subject["id"].as_i64().unwrap();

    let (status, notebook) = send(
        app,
        "POST",
        &format!("/api/subjects/{subject_id}/notebooks"),
        Some(json!({ "title": "Chapter 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let notebook_id = notebook["id"].as_i64().unwrap();

    let (status, note) = send(
        app,
        "POST",
        &format!("/api/notebooks/{notebook_id}/notes"),
        Some(json!({ "title": "Limits", "content": content })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (subject_id, notebook_id, note["id"].as_i64().unwrap())
}

#[tokio::test]
async fn empty_listings() {
    let app = app();

    let (status, subjects) = send(&app, "GET", "/api/subjects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subjects, json!([]));

    let (status, snippets) = send(&app, "GET", "/api/important-snippets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snippets, json!([]));
}

#[tokio::test]
async fn create_subject_applies_default_color() {
    let app = app();
    let (status, subject) = send(&app, "POST", "/api/subjects", Some(json!({ "name": "Physics" }))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subject["name"], "Physics");
    assert_eq!(subject["color"], "#3B82F6");
    assert_eq!(subject["userId"], "default-user");
    assert_eq!(subject["notebookCount"], 0);
}

#[tokio::test]
async fn create_subject_without_name_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/subjects", Some(json!({ "name": "  " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_json_is_bad_request_with_error_body() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/subjects")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn highlight_records_snippet_and_marks_note() {
    let app = app();
    let (subject_id, notebook_id, note_id) = seed(&app, "<p>The derivative measures change</p>").await;

    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/api/notes/{note_id}/highlights"),
        Some(json!({ "block": 0, "start": 4, "end": 14 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["snippet"]["content"], "derivative");
    assert_eq!(outcome["snippet"]["noteTitle"], "Limits");
    assert_eq!(outcome["snippet"]["notebookName"], "Chapter 1");
    assert_eq!(outcome["snippet"]["subjectName"], "Calculus");
    assert_eq!(outcome["snippet"]["subjectId"], subject_id);
    assert_eq!(outcome["snippet"]["notebookId"], notebook_id);
    assert!(
        outcome["note"]["content"]
            .as_str()
            .unwrap()
            .contains(r#"<mark class="important">derivative</mark>"#)
    );

    let (_, note) = send(&app, "GET", &format!("/api/notes/{note_id}"), None).await;
    assert_eq!(note["importantSnippetCount"], 1);

    let (_, snippets) = send(
        &app,
        "GET",
        &format!("/api/important-snippets?subjectId={subject_id}"),
        None,
    )
    .await;
    assert_eq!(snippets.as_array().unwrap().len(), 1);

    let (_, other) = send(&app, "GET", "/api/important-snippets?subjectId=999", None).await;
    assert_eq!(other, json!([]));
}

#[tokio::test]
async fn whitespace_selection_is_rejected() {
    let app = app();
    let (_, _, note_id) = seed(&app, "<p>a b</p>").await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/notes/{note_id}/highlights"),
        Some(json!({ "block": 0, "start": 1, "end": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, snippets) = send(&app, "GET", "/api/important-snippets", None).await;
    assert_eq!(snippets, json!([]));
}

#[tokio::test]
async fn delete_subject_cascades_everything() {
    let app = app();
    let (subject_id, notebook_id, note_id) = seed(&app, "<p>The derivative measures change</p>").await;
    send(
        &app,
        "POST",
        &format!("/api/notes/{note_id}/highlights"),
        Some(json!({ "block": 0, "start": 4, "end": 14 })),
    )
    .await;

    let (status, body) = send(&app, "DELETE", &format!("/api/subjects/{subject_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Subject deleted successfully");
    assert_eq!(body["subject"]["name"], "Calculus");
    assert_eq!(body["notebooksDeleted"], 1);
    assert_eq!(body["notesDeleted"], 1);
    assert_eq!(body["snippetsDeleted"], 1);

    let (_, subjects) = send(&app, "GET", "/api/subjects", None).await;
    assert_eq!(subjects, json!([]));
    let (_, snippets) = send(&app, "GET", "/api/important-snippets", None).await;
    assert_eq!(snippets, json!([]));
    let (status, _) = send(&app, "GET", &format!("/api/notes/{note_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, notes) = send(&app, "GET", &format!("/api/notebooks/{notebook_id}/notes"), None).await;
    assert_eq!(notes, json!([]));
}

#[tokio::test]
async fn delete_over_batch_limit_is_rejected_without_changes() {
    let app = app_with_limit(2);
    let (subject_id, _, _) = seed(&app, "<p>x</p>").await;

    let (status, body) = send(&app, "DELETE", &format!("/api/subjects/{subject_id}"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("limit is 2"));

    let (_, subjects) = send(&app, "GET", "/api/subjects", None).await;
    assert_eq!(subjects.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_subject_delete_is_not_found() {
    let app = app();
    let (status, body) = send(&app, "DELETE", "/api/subjects/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn users_are_isolated_by_header() {
    let app = app();
    seed(&app, "<p>x</p>").await;

    let (status, subjects) = send_as(&app, Some("someone-else"), "GET", "/api/subjects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subjects, json!([]));
}

#[tokio::test]
async fn update_note_and_apply_block_action() {
    let app = app();
    let (_, _, note_id) = seed(&app, "<p>intro</p><blockquote>quoted</blockquote>").await;

    let (status, note) = send(
        &app,
        "PATCH",
        &format!("/api/notes/{note_id}"),
        Some(json!({ "title": "Limits and continuity" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["title"], "Limits and continuity");

    let (status, note) = send(
        &app,
        "POST",
        &format!("/api/notes/{note_id}/actions"),
        Some(json!({ "block": 1, "action": "delete" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!note["content"].as_str().unwrap().contains("quoted"));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/notes/{note_id}/actions"),
        Some(json!({ "block": 9, "action": "delete" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_proxies_to_client() {
    let app = app();

    let (status, body) = send(&app, "POST", "/api/chat", Some(json!({ "message": "limits" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "You asked about limits");

    let (status, body) = send(&app, "POST", "/api/chat", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message is required and must be a string.");

    let (status, body) = send(&app, "POST", "/api/chat", Some(json!({ "message": 42 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message is required and must be a string.");

    let (status, body) = send(&app, "POST", "/api/chat", Some(json!({ "message": "  " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "You asked about   ");
}

#[tokio::test]
async fn stats_and_achievements_reflect_content() {
    let app = app();
    seed(&app, "<p>x</p>").await;

    let (status, body) = send(&app, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["totalSubjects"], 1);
    assert_eq!(body["stats"]["totalNotes"], 1);
    assert_eq!(body["stats"]["currentStreak"], 1);

    let (status, unlocked) = send(&app, "GET", "/api/achievements?unlockedOnly=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(unlocked.as_array().unwrap().iter().all(|a| a["unlocked"] == true));

    let (status, _) = send(&app, "GET", "/api/achievements?category=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn notifications_start_with_welcome_and_can_be_read() {
    let app = app();

    let (status, body) = send(&app, "GET", "/api/notifications", None).await;
    assert_eq!(status, StatusCode::OK);
    let unread = body["unreadCount"].as_u64().unwrap();
    assert!(unread >= 1);
    let first_id = body["notifications"][0]["id"].as_u64().unwrap();

    let (status, body) = send(&app, "POST", &format!("/api/notifications/{first_id}/read"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unreadCount"].as_u64().unwrap(), unread - 1);

    let (status, _) = send(&app, "POST", "/api/notifications/read-all", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/api/notifications?filter=unread", None).await;
    assert_eq!(body["notifications"], json!([]));

    let (status, _) = send(&app, "DELETE", &format!("/api/notifications/{first_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/api/notifications/{first_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn revision_schedule_and_complete() {
    let app = app();
    let (_, _, note_id) = seed(&app, "<p>x</p>").await;

    let (status, plan) = send(&app, "GET", &format!("/api/notes/{note_id}/revisions"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["suggestion"]["days"], 1);
    assert_eq!(plan["studyCount"], 0);

    let (status, schedule) = send(
        &app,
        "POST",
        &format!("/api/notes/{note_id}/revisions"),
        Some(json!({ "days": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(schedule["status"], "scheduled");
    let revision_id = schedule["id"].as_u64().unwrap();

    let (status, done) = send(&app, "POST", &format!("/api/revisions/{revision_id}/complete"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["completed"], true);

    let (_, plan) = send(&app, "GET", &format!("/api/notes/{note_id}/revisions"), None).await;
    assert_eq!(plan["studyCount"], 1);
    assert_eq!(plan["suggestion"]["days"], 3);

    let (_, stats) = send(&app, "GET", "/api/stats", None).await;
    assert_eq!(stats["stats"]["totalRevisions"], 1);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/notes/{note_id}/revisions"),
        Some(json!({ "days": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/notes/999/revisions", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn highlight_works_on_browser_markup() {
    for content in [
        "<p>We say a limit exists when<br></p>",
        "<p>We say a&nbsp;limit exists when</p>",
    ] {
        let app = app();
        let (_, _, note_id) = seed(&app, content).await;

        let (status, outcome) = send(
            &app,
            "POST",
            &format!("/api/notes/{note_id}/highlights"),
            Some(json!({ "block": 0, "start": 9, "end": 21 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "content {content}");
        assert_eq!(outcome["snippet"]["content"], "limit exists");
        assert!(
            outcome["note"]["content"]
                .as_str()
                .unwrap()
                .contains(r#"<mark class="important">limit exists</mark>"#)
        );

        let (_, snippets) = send(&app, "GET", "/api/important-snippets", None).await;
        assert_eq!(snippets.as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn block_action_works_on_browser_markup() {
    let app = app();
    let (_, _, note_id) = seed(&app, "<p>intro&nbsp;text<br></p><blockquote>quoted</blockquote>").await;

    let (status, note) = send(
        &app,
        "POST",
        &format!("/api/notes/{note_id}/actions"),
        Some(json!({ "block": 1, "action": "delete" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let content = note["content"].as_str().unwrap();
    assert!(!content.contains("quoted"));
    assert!(content.contains("intro\u{a0}text<br/>"));
}

#[tokio::test]
async fn revision_days_out_of_range_is_bad_request() {
    let app = app();
    let (_, _, note_id) = seed(&app, "<p>x</p>").await;

    for days in [4_000_000u64, u64::from(u32::MAX)] {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/notes/{note_id}/revisions"),
            Some(json!({ "days": days })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "days {days}");
        assert!(body["error"].as_str().unwrap().starts_with("Days must be between 1 and"));
    }

    let (status, schedule) = send(
        &app,
        "POST",
        &format!("/api/notes/{note_id}/revisions"),
        Some(json!({ "days": 3650 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(schedule["status"], "scheduled");

    let (status, _) = send(&app, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/notes/{note_id}/revisions"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn cascading_deletes_drop_revision_history() {
    for parent in ["subjects", "notebooks"] {
        let app = app();
        let (subject_id, notebook_id, note_id) = seed(&app, "<p>x</p>").await;

        let (_, schedule) = send(
            &app,
            "POST",
            &format!("/api/notes/{note_id}/revisions"),
            Some(json!({ "days": 1 })),
        )
        .await;
        let revision_id = schedule["id"].as_u64().unwrap();
        send(&app, "POST", &format!("/api/revisions/{revision_id}/complete"), None).await;
        let (_, stats) = send(&app, "GET", "/api/stats", None).await;
        assert_eq!(stats["stats"]["totalRevisions"], 1);

        let id = if parent == "subjects" { subject_id } else { notebook_id };
        let (status, _) = send(&app, "DELETE", &format!("/api/{parent}/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, stats) = send(&app, "GET", "/api/stats", None).await;
        assert_eq!(stats["stats"]["totalRevisions"], 0, "after deleting {parent}");
        let (status, _) = send(&app, "POST", &format!("/api/revisions/{revision_id}/complete"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn create_snippet_requires_every_field() {
    let app = app();
    let (subject_id, notebook_id, note_id) = seed(&app, "<p>x</p>").await;

    for body in [
        json!({}),
        json!({ "content": "limit", "noteId": note_id, "notebookId": notebook_id }),
        json!({ "noteId": note_id, "notebookId": notebook_id, "subjectId": subject_id }),
        json!({ "content": "", "noteId": note_id, "notebookId": notebook_id, "subjectId": subject_id }),
    ] {
        let (status, error) = send(&app, "POST", "/api/important-snippets", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(error["error"], "Missing required fields");
    }

    let (status, snippet) = send(
        &app,
        "POST",
        "/api/important-snippets",
        Some(json!({
            "content": "limit",
            "noteId": note_id,
            "notebookId": notebook_id,
            "subjectId": subject_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(snippet["content"], "limit");
    assert_eq!(snippet["noteTitle"], "Limits");
}
