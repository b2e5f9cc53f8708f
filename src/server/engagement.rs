//! Chat, stats, achievements, notifications and revisions.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{ApiError, ApiJson, AppState, CurrentUser};
use crate::error::ServiceError;
use crate::gamification::{
    self, Achievement, AchievementCategory, MAX_REVISION_DAYS, Notification, NotificationFilter,
    QUICK_PICKS, RevisionSchedule, RevisionSuggestion, ScheduleStatus, UserStats,
};
use crate::{NoteId, UserId};

/// Body of `POST /api/chat`. A missing or non-string `message` is sent on
/// as empty so the client reports it after the key check.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    message: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    content: String,
}

pub async fn chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let message = request
        .message
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    let client = state.chat();
    let content = tokio::task::spawn_blocking(move || client.complete(&message))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "chat task failed");
            ApiError::internal("Failed to fetch a response from the chat API")
        })??;
    Ok(Json(ChatReply { content }))
}

/// Stats with the in-memory revision total filled in.
async fn current_stats(state: &AppState, user: &UserId) -> Result<UserStats, ApiError> {
    let owner = user.clone();
    let mut stats = state
        .with_service("fetch stats", move |s| {
            s.user_stats(&owner, OffsetDateTime::now_utc())
        })
        .await?;
    stats.total_revisions = state.with_planner(|planner| planner.total_revisions(user))?;
    Ok(stats)
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    stats: UserStats,
    achievements: Vec<Achievement>,
}

pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = current_stats(&state, &user).await?;
    let achievements = gamification::evaluate(&stats);
    Ok(Json(StatsResponse {
        stats,
        achievements,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementQuery {
    category: Option<String>,
    #[serde(default)]
    unlocked_only: bool,
}

pub async fn achievements(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AchievementQuery>,
) -> Result<Json<Vec<Achievement>>, ApiError> {
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(raw.parse::<AchievementCategory>().map_err(ApiError::bad_request)?),
    };
    let stats = current_stats(&state, &user).await?;
    let all = gamification::evaluate(&stats);
    Ok(Json(gamification::filter(&all, category, query.unlocked_only)))
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    filter: NotificationFilter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    notifications: Vec<Notification>,
    unread_count: usize,
}

/// Lists the feed after folding in new unlocks, idle subjects and due
/// revisions.
pub async fn notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationList>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let stats = current_stats(&state, &user).await?;
    let owner = user.clone();
    let activity = state
        .with_service("fetch notifications", move |s| s.subject_activity(&owner))
        .await?;
    let due = state.with_planner(|planner| planner.due_today(&user, now))?;
    let achievements = gamification::evaluate(&stats);

    let list = state.with_feed(&user, |feed| {
        feed.refresh(&achievements, &activity, &due, now);
        NotificationList {
            notifications: feed.list(query.filter),
            unread_count: feed.unread_count(),
        }
    })?;
    Ok(Json(list))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    unread_count: usize,
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<UnreadCount>, ApiError> {
    let (found, unread_count) =
        state.with_feed(&user, |feed| (feed.mark_read(id), feed.unread_count()))?;
    if !found {
        return Err(ApiError::not_found(format!("notification not found: {id}")));
    }
    Ok(Json(UnreadCount { unread_count }))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UnreadCount>, ApiError> {
    state.with_feed(&user, |feed| feed.mark_all_read())?;
    Ok(Json(UnreadCount { unread_count: 0 }))
}

pub async fn remove_notification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.with_feed(&user, |feed| feed.remove(id))? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("notification not found: {id}")))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    #[serde(flatten)]
    schedule: RevisionSchedule,
    status: ScheduleStatus,
}

impl ScheduleView {
    fn new(schedule: RevisionSchedule, now: OffsetDateTime) -> Self {
        let status = schedule.status(now);
        Self { schedule, status }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionPlan {
    suggestion: RevisionSuggestion,
    quick_picks: &'static [RevisionSuggestion],
    study_count: u32,
    schedules: Vec<ScheduleView>,
}

/// Loads a note's title, failing with 404 for unknown notes.
async fn note_title(state: &AppState, user: &UserId, note_id: NoteId) -> Result<String, ApiError> {
    let owner = user.clone();
    state
        .with_service("fetch note", move |s| {
            s.get_note(&owner, note_id)?
                .map(|note| note.title)
                .ok_or_else(|| ServiceError::not_found("note", note_id.get()))
        })
        .await
}

pub async fn revision_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<RevisionPlan>, ApiError> {
    let note_id = NoteId::new(id);
    note_title(&state, &user, note_id).await?;

    let now = OffsetDateTime::now_utc();
    let plan = state.with_planner(|planner| {
        let study_count = planner.study_count(&user, note_id);
        RevisionPlan {
            suggestion: gamification::suggest(study_count),
            quick_picks: &QUICK_PICKS,
            study_count,
            schedules: planner
                .schedules(&user)
                .iter()
                .filter(|s| s.note_id == note_id)
                .cloned()
                .map(|s| ScheduleView::new(s, now))
                .collect(),
        }
    })?;
    Ok(Json(plan))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    days: u32,
}

pub async fn schedule_revision(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<ScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleView>), ApiError> {
    let out_of_range = || {
        ApiError::bad_request(format!("Days must be between 1 and {MAX_REVISION_DAYS}"))
    };
    if !(1..=MAX_REVISION_DAYS).contains(&request.days) {
        return Err(out_of_range());
    }
    let note_id = NoteId::new(id);
    let title = note_title(&state, &user, note_id).await?;

    let now = OffsetDateTime::now_utc();
    let schedule = state
        .with_planner(|planner| planner.schedule(&user, note_id, &title, request.days, now))?
        .ok_or_else(out_of_range)?;
    Ok((StatusCode::CREATED, Json(ScheduleView::new(schedule, now))))
}

pub async fn complete_revision(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<ScheduleView>, ApiError> {
    let now = OffsetDateTime::now_utc();
    state
        .with_planner(|planner| planner.complete(&user, id))?
        .map(|schedule| Json(ScheduleView::new(schedule, now)))
        .ok_or_else(|| ApiError::not_found(format!("revision not found: {id}")))
}
