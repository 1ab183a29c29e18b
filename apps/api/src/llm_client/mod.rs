/// LLM Client: the single point of entry for all model calls in Caseboard.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All model interactions MUST go through this module, and callers depend on
/// the [`ObjectStreamer`] trait rather than on [`LlmClient`] itself.
///
/// Model: claude-sonnet-4-5 (hardcoded in one place)
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod partial_json;
pub mod prompts;
pub mod sse;

use partial_json::{MalformedJson, PartialObjectDecoder};
use sse::{ContentBlockDelta, Delta, EventStream, MessageDelta, StreamEvent};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls in Caseboard.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;
const MAX_RETRIES: u32 = 3;
/// Stop reasons that mean the forced tool call was written out in full.
const COMPLETE_STOP_REASONS: &[&str] = &["tool_use", "end_turn"];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Model stream ended before completion")]
    Interrupted,

    #[error("Model stopped early (stop reason: {0})")]
    Incomplete(String),

    #[error("Model produced malformed output: {0}")]
    Malformed(#[from] MalformedJson),
}

/// A structured-output request: the model must answer by filling `schema`.
#[derive(Debug, Clone)]
pub struct ObjectRequest {
    pub system: String,
    pub prompt: String,
    pub tool_name: String,
    pub tool_description: String,
    pub schema: Value,
}

/// Successive, increasingly complete versions of the requested object.
/// Ends after the final version on success; yields one `Err` and ends on failure.
pub type PartialObjectStream = Pin<Box<dyn Stream<Item = Result<Value, LlmError>> + Send>>;

/// The model completion seam. `LlmClient` is the production implementation;
/// tests substitute scripted streamers.
#[async_trait]
pub trait ObjectStreamer: Send + Sync {
    async fn stream_object(&self, request: ObjectRequest) -> Result<PartialObjectStream, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    tools: Vec<AnthropicTool<'a>>,
    tool_choice: ToolChoice<'a>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    choice_type: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all services in Caseboard.
/// Wraps the Anthropic Messages API with retry logic and streamed structured output.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            api_key,
            base_url: ANTHROPIC_API_URL.to_string(),
        })
    }

    /// Points the client at a different endpoint (wiremock in tests).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Opens a streaming request, retrying 429 and 5xx with exponential backoff.
    async fn open_stream(&self, request: &ObjectRequest) -> Result<EventStream, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: &request.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
            tools: vec![AnthropicTool {
                name: &request.tool_name,
                description: &request.tool_description,
                input_schema: &request.schema,
            }],
            tool_choice: ToolChoice {
                choice_type: "tool",
                name: &request.tool_name,
            },
            stream: true,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM stream attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            debug!("LLM stream opened (tool: {})", request.tool_name);
            return Ok(sse::parse_sse_stream(response));
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ObjectStreamer for LlmClient {
    async fn stream_object(&self, request: ObjectRequest) -> Result<PartialObjectStream, LlmError> {
        let events = self.open_stream(&request).await?;
        Ok(decode_partial_objects(events))
    }
}

/// Folds tool-input JSON fragments into progressively decoded objects.
///
/// The stream must end with `message_stop` after a complete stop reason, and
/// the accumulated tool input must then parse strictly. Anything else (an
/// `error` event, a transport failure, malformed or truncated input, or the
/// body simply ending) is surfaced as an error.
fn decode_partial_objects(events: EventStream) -> PartialObjectStream {
    struct Decoding {
        events: EventStream,
        decoder: PartialObjectDecoder,
        stop_reason: Option<String>,
    }

    let state = Some(Decoding {
        events,
        decoder: PartialObjectDecoder::default(),
        stop_reason: None,
    });

    let partials = stream::unfold(state, |state| async move {
        let mut state = state?;
        loop {
            match state.events.next().await {
                Some(Ok(StreamEvent::ContentBlockDelta(ContentBlockDelta { index, delta }))) => {
                    match delta {
                        Delta::InputJsonDelta { partial_json } => {
                            match state.decoder.push(&partial_json) {
                                Ok(Some(value)) => return Some((Ok(value), Some(state))),
                                Ok(None) => {}
                                Err(e) => return Some((Err(LlmError::Malformed(e)), None)),
                            }
                        }
                        Delta::TextDelta { text } => {
                            debug!("Ignoring {} chars of free text in block {index}", text.len());
                        }
                        Delta::Unsupported => {}
                    }
                }
                Some(Ok(StreamEvent::MessageDelta(MessageDelta { delta }))) => {
                    if delta.stop_reason.is_some() {
                        state.stop_reason = delta.stop_reason;
                    }
                }
                Some(Ok(StreamEvent::MessageStop)) => {
                    if let Some(reason) = state.stop_reason.as_deref() {
                        if !COMPLETE_STOP_REASONS.contains(&reason) {
                            warn!("LLM stream stopped with reason {reason}");
                            return Some((Err(LlmError::Incomplete(reason.to_string())), None));
                        }
                    }
                    return match state.decoder.finish() {
                        Ok(Some(value)) => Some((Ok(value), None)),
                        Ok(None) => None,
                        Err(e) => Some((Err(LlmError::Parse(e)), None)),
                    };
                }
                Some(Ok(StreamEvent::Error(err))) => {
                    let error = LlmError::Stream(format!("{}: {}", err.error_type, err.message));
                    return Some((Err(error), None));
                }
                Some(Ok(StreamEvent::Other)) => {}
                Some(Err(e)) => return Some((Err(e), None)),
                None => return Some((Err(LlmError::Interrupted), None)),
            }
        }
    });

    Box::pin(partials)
}
