pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::contacts::handlers as contacts;
use crate::state::AppState;
use crate::summary::handlers as summary;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Contacts
        .route("/api/v1/contacts", get(contacts::handle_list_contacts))
        .route("/api/v1/contacts/:id", get(contacts::handle_get_contact))
        // AI summaries
        .route(
            "/api/v1/contacts/:id/summary",
            get(summary::handle_get_summary),
        )
        .route(
            "/api/v1/contacts/:id/summary/refresh",
            post(summary::handle_refresh_summary),
        )
        // Canned summaries for older dashboard builds
        .route("/api/summary/:id", get(contacts::handle_legacy_summary))
        .with_state(state)
}
