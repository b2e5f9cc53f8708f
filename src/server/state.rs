use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use time::OffsetDateTime;

use super::{ApiError, USER_HEADER};
use crate::chat::ChatClientTrait;
use crate::error::ServiceResult;
use crate::gamification::{NotificationFeed, RevisionPlanner};
use crate::{CanvasService, UserId};

/// Shared handles for all handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<Mutex<CanvasService>>,
    chat: Arc<dyn ChatClientTrait>,
    feeds: Arc<Mutex<HashMap<UserId, NotificationFeed>>>,
    planner: Arc<Mutex<RevisionPlanner>>,
    default_user: UserId,
}

impl AppState {
    pub fn new(service: CanvasService, chat: Arc<dyn ChatClientTrait>, default_user: UserId) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
            chat,
            feeds: Arc::new(Mutex::new(HashMap::new())),
            planner: Arc::new(Mutex::new(RevisionPlanner::new())),
            default_user,
        }
    }

    pub fn default_user(&self) -> &UserId {
        &self.default_user
    }

    pub(crate) fn chat(&self) -> Arc<dyn ChatClientTrait> {
        Arc::clone(&self.chat)
    }

    /// Runs a store operation on the blocking pool.
    ///
    /// `action` completes the message of internal errors ("Failed to ...").
    pub(crate) async fn with_service<T, F>(&self, action: &'static str, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&CanvasService) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || {
            let service = lock(&service, action)?;
            f(&service).map_err(|err| ApiError::from_service(err, action))
        })
        .await
        .map_err(|err| {
            tracing::error!(error = %err, action, "blocking task failed");
            ApiError::internal(format!("Failed to {action}"))
        })?
    }

    /// Runs `f` on the user's notification feed, creating it on first use.
    pub(crate) fn with_feed<T>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut NotificationFeed) -> T,
    ) -> Result<T, ApiError> {
        let mut feeds = lock(&self.feeds, "load notifications")?;
        let feed = feeds
            .entry(user.clone())
            .or_insert_with(|| NotificationFeed::new(OffsetDateTime::now_utc()));
        Ok(f(feed))
    }

    pub(crate) fn with_planner<T>(
        &self,
        f: impl FnOnce(&mut RevisionPlanner) -> T,
    ) -> Result<T, ApiError> {
        let mut planner = lock(&self.planner, "load revisions")?;
        Ok(f(&mut planner))
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, action: &str) -> Result<MutexGuard<'a, T>, ApiError> {
    mutex.lock().map_err(|_| {
        tracing::error!(action, "state lock poisoned");
        ApiError::internal(format!("Failed to {action}"))
    })
}

/// The acting user: the `x-user-id` header, else the configured default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        Ok(Self(match header {
            Some(id) => UserId::new(id),
            None => state.default_user.clone(),
        }))
    }
}
