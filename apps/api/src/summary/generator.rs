//! Contact summary generation: orchestrates the AI summary pipeline.
//!
//! Flow: calculate_status → (no credential? canned fixture) →
//!       build prompt → stream structured output → forward partials →
//!       validate final object → write session cache.
//!
//! The cache is written only once the model has finished and the final object
//! validates. A failed or abandoned regeneration never touches the previous entry.

use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::contacts::fixtures::FixtureStore;
use crate::contacts::status::{calculate_status_at, days_since_response, NEVER_RESPONDED_DAYS};
use crate::llm_client::prompts::STRUCTURED_OUTPUT_SYSTEM;
use crate::llm_client::{LlmError, ObjectRequest, ObjectStreamer};
use crate::models::contact::{ContactStatus, ContactWithContext};
use crate::summary::cache::SummaryCache;
use crate::summary::models::{PartialSummary, SummaryResult};
use crate::summary::prompts::{
    ESCALATION_INSTRUCTION, NEVER_RESPONDED, NO_ESCALATION_INSTRUCTION, NO_NOTES, SUMMARY_FOCUS,
    SUMMARY_ROLE, SUMMARY_TOOL_DESCRIPTION, SUMMARY_TOOL_NAME,
};

/// Conversation entries included in the prompt, most recent last.
const RECENT_CONVERSATIONS: usize = 5;

#[derive(Debug, Clone, Error)]
pub enum SummaryError {
    #[error("AI generation failed: {0}")]
    Generation(String),

    #[error("AI returned an invalid summary: {0}")]
    Schema(String),

    #[error("No canned summary available for contact {0}")]
    MissingFixture(String),
}

impl From<LlmError> for SummaryError {
    fn from(e: LlmError) -> Self {
        SummaryError::Generation(e.to_string())
    }
}

/// Partial results in arrival order. Ends cleanly on success; on failure the
/// last item is an `Err` describing what went wrong.
pub type SummaryStream = Pin<Box<dyn Stream<Item = Result<PartialSummary, SummaryError>> + Send>>;

pub enum SummaryOutcome {
    /// Canned fixture served because no model credential is configured.
    Static(SummaryResult),
    /// Served from the session cache without calling the model.
    Cached(PartialSummary),
    /// Live generation in progress.
    Stream(SummaryStream),
}

pub struct SummaryGenerator {
    /// `None` when no model credential is configured.
    streamer: Option<Arc<dyn ObjectStreamer>>,
    fixtures: Arc<FixtureStore>,
    cache: Arc<dyn SummaryCache>,
}

impl SummaryGenerator {
    pub fn new(
        streamer: Option<Arc<dyn ObjectStreamer>>,
        fixtures: Arc<FixtureStore>,
        cache: Arc<dyn SummaryCache>,
    ) -> Self {
        Self {
            streamer,
            fixtures,
            cache,
        }
    }

    /// Cache-aware entry point. A cached entry with a non-empty summary is
    /// returned as-is unless `refresh` forces a new generation.
    pub async fn load(
        &self,
        contact: &ContactWithContext,
        refresh: bool,
    ) -> Result<SummaryOutcome, SummaryError> {
        if !refresh {
            if let Some(cached) = self.cache.get(contact.id()).await {
                if cached.has_summary() {
                    info!("Summary cache hit for {}", contact.id());
                    return Ok(SummaryOutcome::Cached(cached));
                }
            }
        }
        self.generate(contact, Utc::now()).await
    }

    /// Produces a summary for `contact`, either immediately from fixtures or as
    /// a live stream of partial results.
    pub async fn generate(
        &self,
        contact: &ContactWithContext,
        now: DateTime<Utc>,
    ) -> Result<SummaryOutcome, SummaryError> {
        let status = calculate_status_at(contact, now);

        let Some(streamer) = self.streamer.clone() else {
            let result = self.canned_summary(contact, status)?;
            self.cache.set(contact.id(), &result.clone().into()).await;
            return Ok(SummaryOutcome::Static(result));
        };

        info!("Generating AI summary for {} (status: {status})", contact.id());

        let request = ObjectRequest {
            system: format!("{SUMMARY_ROLE} {STRUCTURED_OUTPUT_SYSTEM}"),
            prompt: build_summary_prompt(contact, status, now),
            tool_name: SUMMARY_TOOL_NAME.to_string(),
            tool_description: SUMMARY_TOOL_DESCRIPTION.to_string(),
            schema: summary_schema()?,
        };

        let partials = streamer.stream_object(request).await.map_err(|e| {
            warn!("Summary generation failed to start for {}: {e}", contact.id());
            SummaryError::from(e)
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cache = Arc::clone(&self.cache);
        let contact_id = contact.id().to_string();

        // Runs to completion even if the subscriber goes away.
        tokio::spawn(async move {
            match forward_partials(partials, &tx).await {
                Ok(result) => {
                    cache.set(&contact_id, &result.into()).await;
                    info!("AI summary completed for {contact_id}");
                }
                Err(e) => {
                    warn!("AI summary failed for {contact_id}: {e}");
                    let _ = tx.send(Err(e));
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(SummaryOutcome::Stream(Box::pin(stream)))
    }

    /// Static fallback: the canned pair for this contact, with the escalation
    /// kept only for needs-attention contacts.
    fn canned_summary(
        &self,
        contact: &ContactWithContext,
        status: ContactStatus,
    ) -> Result<SummaryResult, SummaryError> {
        let canned = self
            .fixtures
            .canned_summary(contact.id())
            .ok_or_else(|| SummaryError::MissingFixture(contact.id().to_string()))?;

        Ok(SummaryResult {
            summary: canned.summary.clone(),
            escalation: match status {
                ContactStatus::NeedsAttention => canned.escalation.clone(),
                _ => None,
            },
        })
    }
}

/// Forwards every decoded partial to the subscriber and returns the final,
/// validated result. Send failures (subscriber gone) are ignored.
async fn forward_partials(
    mut partials: crate::llm_client::PartialObjectStream,
    tx: &mpsc::UnboundedSender<Result<PartialSummary, SummaryError>>,
) -> Result<SummaryResult, SummaryError> {
    let mut latest = serde_json::Value::Null;

    while let Some(value) = partials.next().await {
        let value = value?;
        let partial: PartialSummary = serde_json::from_value(value.clone())
            .map_err(|e| SummaryError::Schema(e.to_string()))?;
        latest = value;
        let _ = tx.send(Ok(partial));
    }

    serde_json::from_value::<SummaryResult>(latest)
        .map_err(|e| SummaryError::Schema(e.to_string()))
}

/// JSON Schema of [`SummaryResult`], used as the tool input schema.
fn summary_schema() -> Result<serde_json::Value, SummaryError> {
    serde_json::to_value(schemars::schema_for!(SummaryResult))
        .map_err(|e| SummaryError::Schema(format!("Failed to serialize schema: {e}")))
}

/// Builds the summary prompt. Deterministic for a given contact, status and `now`.
pub fn build_summary_prompt(
    contact: &ContactWithContext,
    status: ContactStatus,
    now: DateTime<Utc>,
) -> String {
    let last_response = match days_since_response(contact, now) {
        NEVER_RESPONDED_DAYS => NEVER_RESPONDED.to_string(),
        days => format!("{days} days ago"),
    };

    let skip = contact
        .conversations
        .len()
        .saturating_sub(RECENT_CONVERSATIONS);
    let recent_conversations = contact
        .conversations
        .iter()
        .skip(skip)
        .map(|c| format!("[{}] {}", c.kind, c.content))
        .collect::<Vec<_>>()
        .join("\n");

    let pending = &contact.pending_items;
    let forms = if pending.forms.complete {
        "Complete"
    } else {
        "Incomplete"
    };
    let overdue = if pending.invoices.overdue {
        " (OVERDUE)"
    } else {
        ""
    };

    let notes = if contact.notes.is_empty() {
        NO_NOTES.to_string()
    } else {
        contact.notes.join("; ")
    };

    let escalation = match status {
        ContactStatus::NeedsAttention => ESCALATION_INSTRUCTION,
        _ => NO_ESCALATION_INSTRUCTION,
    };

    format!(
        "You are summarizing a bankruptcy client's status for their attorney.

Client: {name} (Chapter {chapter})
Last response: {last_response}
Follow-ups sent: {follow_ups}

Recent conversations:
{recent_conversations}

Pending items:
- Documents: {uploaded}/{required} uploaded
- Forms: {forms}
- Invoices: ${unpaid} unpaid{overdue}

Notes: {notes}

{SUMMARY_FOCUS}

{escalation}",
        name = contact.contact.name,
        chapter = contact.contact.chapter,
        follow_ups = contact.follow_up_count,
        uploaded = pending.documents.uploaded,
        required = pending.documents.required,
        unpaid = format_dollars(pending.invoices.unpaid()),
    )
}

/// Whole-dollar amounts print without cents.
fn format_dollars(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}
