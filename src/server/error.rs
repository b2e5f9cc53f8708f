use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::chat::ChatError;
use crate::error::ServiceError;

/// Error response rendered as `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Maps a service error. Internal failures are logged and reported as
    /// `Failed to {action}`.
    pub fn from_service(err: ServiceError, action: &str) -> Self {
        let status = match &err {
            ServiceError::Validation(_) | ServiceError::Editor(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::BatchLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Database(_) | ServiceError::Timestamp(_) => {
                tracing::error!(error = %err, action, "request failed");
                return Self::internal(format!("Failed to {action}"));
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage => Self::bad_request(err.to_string()),
            ChatError::MissingApiKey => Self::internal(err.to_string()),
            ChatError::Http { status, .. } => Self::new(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                err.to_string(),
            ),
            ChatError::Network(_)
            | ChatError::Timeout(_)
            | ChatError::Serialization(_)
            | ChatError::InvalidUrl(_) => {
                tracing::error!(error = %err, "chat request failed");
                Self::internal("Failed to fetch a response from the chat API")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// `Json` extractor whose rejections use the API error shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorError;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Validation("Name is required".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::NotFound {
                    entity: "note",
                    id: 3,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::BatchLimitExceeded {
                    operations: 10,
                    limit: 5,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::Editor(EditorError::EmptySelection),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from_service(err, "do it").status, status);
        }
    }

    #[test]
    fn database_errors_are_generic() {
        let err = ApiError::from_service(
            ServiceError::Database(rusqlite::Error::QueryReturnedNoRows),
            "fetch subjects",
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to fetch subjects");
    }

    #[test]
    fn chat_errors_keep_upstream_status() {
        let err = ApiError::from(ChatError::Http {
            status: 429,
            body: "rate limited".into(),
        });
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message, "API error 429: rate limited");

        assert_eq!(
            ApiError::from(ChatError::MissingApiKey).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(ChatError::EmptyMessage).status,
            StatusCode::BAD_REQUEST
        );
    }
}
