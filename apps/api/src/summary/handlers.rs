//! Axum route handlers for AI contact summaries.
//!
//! Immediate results (canned or cached) are plain JSON. Live generations are
//! relayed as server-sent events: `partial` for every update, then exactly one
//! terminal `done` or `error`.

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::AppError;
use crate::state::AppState;
use crate::summary::generator::{SummaryOutcome, SummaryStream};
use crate::summary::models::PartialSummary;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Static,
    Cache,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub source: SummarySource,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation: Option<String>,
}

/// GET /api/v1/contacts/:id/summary?refresh=
pub async fn handle_get_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<SummaryQuery>,
) -> Result<Response, AppError> {
    let refresh = parse_refresh(params.refresh.as_deref())?;
    load_summary(&state, &id, refresh).await
}

/// POST /api/v1/contacts/:id/summary/refresh
///
/// Discards the cached summary for this request and regenerates.
pub async fn handle_refresh_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    load_summary(&state, &id, true).await
}

async fn load_summary(state: &AppState, id: &str, refresh: bool) -> Result<Response, AppError> {
    let contact = state
        .contacts
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Contact {id} not found")))?;

    let response = match state.summaries.load(contact, refresh).await? {
        SummaryOutcome::Static(result) => Json(SummaryResponse {
            source: SummarySource::Static,
            summary: result.summary,
            escalation: result.escalation,
        })
        .into_response(),
        SummaryOutcome::Cached(cached) => Json(SummaryResponse {
            source: SummarySource::Cache,
            summary: cached.summary.unwrap_or_default(),
            escalation: cached.escalation,
        })
        .into_response(),
        SummaryOutcome::Stream(partials) => Sse::new(summary_events(partials))
            .keep_alive(KeepAlive::default())
            .into_response(),
    };
    Ok(response)
}

fn parse_refresh(raw: Option<&str>) -> Result<bool, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(AppError::Validation(format!(
            "refresh must be true or false, got '{other}'"
        ))),
    }
}

struct Relay {
    partials: SummaryStream,
    last: PartialSummary,
}

/// Maps generator output to SSE frames, ending with `done` (carrying the
/// final summary) or `error`.
fn summary_events(
    partials: SummaryStream,
) -> impl futures::Stream<Item = Result<Event, Infallible>> + Send {
    let relay = Some(Relay {
        partials,
        last: PartialSummary::default(),
    });

    stream::unfold(relay, |relay| async move {
        let mut relay = relay?;
        match relay.partials.next().await {
            Some(Ok(partial)) => {
                let event = json_event("partial", &partial);
                relay.last = partial;
                Some((event, Some(relay)))
            }
            Some(Err(e)) => Some((
                json_event("error", &json!({ "message": e.to_string() })),
                None,
            )),
            None => Some((json_event("done", &relay.last), None)),
        }
    })
    .map(Ok)
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::generator::SummaryError;

    #[test]
    fn test_parse_refresh() {
        assert!(!parse_refresh(None).unwrap());
        assert!(!parse_refresh(Some("false")).unwrap());
        assert!(parse_refresh(Some("true")).unwrap());
        assert!(parse_refresh(Some("1")).unwrap());
        assert!(matches!(
            parse_refresh(Some("yes")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_static_response_omits_missing_escalation() {
        let body = serde_json::to_value(SummaryResponse {
            source: SummarySource::Static,
            summary: "On track.".to_string(),
            escalation: None,
        })
        .unwrap();
        assert_eq!(body, json!({"source": "static", "summary": "On track."}));
    }

    #[tokio::test]
    async fn test_relay_ends_with_single_terminal_event() {
        let ok: SummaryStream = Box::pin(stream::iter(vec![Ok(PartialSummary {
            summary: Some("Done.".to_string()),
            escalation: None,
        })]));
        assert_eq!(summary_events(ok).collect::<Vec<_>>().await.len(), 2);

        let failed: SummaryStream = Box::pin(stream::iter(vec![
            Ok(PartialSummary::default()),
            Err(SummaryError::Generation("boom".to_string())),
        ]));
        assert_eq!(summary_events(failed).collect::<Vec<_>>().await.len(), 2);
    }
}
