//! JSON HTTP API over [`CanvasService`](crate::CanvasService).
//!
//! Every store and chat call runs on tokio's blocking pool; handlers never
//! touch SQLite or the blocking HTTP client on a runtime worker.

mod content;
mod engagement;
mod error;
mod state;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiJson};
pub use state::{AppState, CurrentUser};

/// Header naming the acting user.
pub const USER_HEADER: &str = "x-user-id";

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/subjects",
            get(content::list_subjects).post(content::create_subject),
        )
        .route("/api/subjects/{id}", delete(content::delete_subject))
        .route(
            "/api/subjects/{id}/notebooks",
            get(content::list_notebooks).post(content::create_notebook),
        )
        .route("/api/notebooks/{id}", delete(content::delete_notebook))
        .route(
            "/api/notebooks/{id}/notes",
            get(content::list_notes).post(content::create_note),
        )
        .route(
            "/api/notes/{id}",
            get(content::get_note)
                .patch(content::update_note)
                .delete(content::delete_note),
        )
        .route("/api/notes/{id}/blocks", post(content::insert_block))
        .route("/api/notes/{id}/actions", post(content::apply_action))
        .route("/api/notes/{id}/highlights", post(content::mark_important))
        .route(
            "/api/important-snippets",
            get(content::list_snippets).post(content::create_snippet),
        )
        .route("/api/chat", post(engagement::chat))
        .route("/api/stats", get(engagement::stats))
        .route("/api/achievements", get(engagement::achievements))
        .route("/api/notifications", get(engagement::notifications))
        .route(
            "/api/notifications/read-all",
            post(engagement::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/{id}/read",
            post(engagement::mark_notification_read),
        )
        .route(
            "/api/notifications/{id}",
            delete(engagement::remove_notification),
        )
        .route(
            "/api/notes/{id}/revisions",
            get(engagement::revision_plan).post(engagement::schedule_revision),
        )
        .route(
            "/api/revisions/{id}/complete",
            post(engagement::complete_revision),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read bound address")?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
