//! Axum route handlers for the contact dashboard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::contacts::status::calculate_status;
use crate::errors::AppError;
use crate::models::contact::{Chapter, ContactStatus, ContactWithContext};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// One row of the contact list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactListItem {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub chapter: Chapter,
    pub avatar_color: String,
    pub status: ContactStatus,
    pub status_label: &'static str,
}

impl ContactListItem {
    fn from_contact(contact: &ContactWithContext) -> Self {
        let status = calculate_status(contact);
        let c = &contact.contact;
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            chapter: c.chapter,
            avatar_color: c.avatar_color.clone(),
            status,
            status_label: status.label(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetailResponse {
    #[serde(flatten)]
    pub contact: ContactWithContext,
    pub status: ContactStatus,
    pub status_label: &'static str,
}

/// GET /api/v1/contacts?q=
///
/// Lists contacts with their computed status, optionally filtered by name or email.
pub async fn handle_list_contacts(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<ContactListItem>> {
    let query = params.q.unwrap_or_default();
    let items = state
        .contacts
        .search(&query)
        .into_iter()
        .map(ContactListItem::from_contact)
        .collect();
    Json(items)
}

/// GET /api/v1/contacts/:id
pub async fn handle_get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContactDetailResponse>, AppError> {
    let contact = state
        .contacts
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Contact {id} not found")))?;

    let status = calculate_status(contact);
    Ok(Json(ContactDetailResponse {
        contact: contact.clone(),
        status,
        status_label: status.label(),
    }))
}

/// GET /api/summary/:id
///
/// Canned summary lookup kept for older dashboard builds. Unlike the rest of
/// the API, the 404 body is a bare `{"error": "..."}` object.
pub async fn handle_legacy_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.contacts.canned_summary(&id) {
        Some(summary) => Json(summary.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Summary not found" })),
        )
            .into_response(),
    }
}
