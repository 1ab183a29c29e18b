//! Server-sent event decoding for streamed Anthropic responses.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;

use crate::llm_client::LlmError;

/// The subset of the streaming protocol the client acts on.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    ContentBlockDelta(ContentBlockDelta),
    MessageDelta(MessageDelta),
    MessageStop,
    Error(StreamErrorBody),
    /// message_start, content_block_start/stop, ping.
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlockDelta {
    pub index: usize,
    pub delta: Delta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Unsupported,
}

/// Top-level message update; carries the stop reason near the end of a stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDelta {
    #[serde(default)]
    pub delta: MessageDeltaBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDeltaBody {
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamError {
    pub error: StreamErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Turns a streaming HTTP response into typed events.
/// Unknown event names are skipped.
pub fn parse_sse_stream(response: reqwest::Response) -> EventStream {
    let events = response.bytes_stream().eventsource();

    let mapped = events.filter_map(|result| async move {
        let event = match result {
            Ok(event) => event,
            Err(e) => return Some(Err(LlmError::Stream(e.to_string()))),
        };
        let parsed = match event.event.as_str() {
            "content_block_delta" => serde_json::from_str::<ContentBlockDelta>(&event.data)
                .map(StreamEvent::ContentBlockDelta)
                .map_err(LlmError::Parse),
            "error" => serde_json::from_str::<StreamError>(&event.data)
                .map(|e| StreamEvent::Error(e.error))
                .map_err(LlmError::Parse),
            "message_delta" => serde_json::from_str::<MessageDelta>(&event.data)
                .map(StreamEvent::MessageDelta)
                .map_err(LlmError::Parse),
            "message_stop" => Ok(StreamEvent::MessageStop),
            "message_start" | "content_block_start" | "content_block_stop" | "ping" => {
                Ok(StreamEvent::Other)
            }
            _ => return None,
        };
        Some(parsed)
    });

    Box::pin(mapped)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn sse_response(body: &str) -> reqwest::Response {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body.to_string()),
            )
            .mount(&server)
            .await;
        reqwest::get(server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn test_parses_input_json_delta() {
        let body = "event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"summ\"}}\n\n";
        let mut events = parse_sse_stream(sse_response(body).await);

        match events.next().await.unwrap().unwrap() {
            StreamEvent::ContentBlockDelta(ContentBlockDelta {
                delta: Delta::InputJsonDelta { partial_json },
                ..
            }) => assert_eq!(partial_json, "{\"summ"),
            other => panic!("expected input_json_delta, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_skips_unknown_events_and_reports_stop() {
        let body = "event: brand_new_event\ndata: {}\n\nevent: ping\ndata: {}\n\nevent: message_stop\ndata: {}\n\n";
        let mut events = parse_sse_stream(sse_response(body).await);

        assert!(matches!(
            events.next().await.unwrap().unwrap(),
            StreamEvent::Other
        ));
        assert!(matches!(
            events.next().await.unwrap().unwrap(),
            StreamEvent::MessageStop
        ));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_parses_error_event() {
        let body = "event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n";
        let mut events = parse_sse_stream(sse_response(body).await);

        match events.next().await.unwrap().unwrap() {
            StreamEvent::Error(err) => {
                assert_eq!(err.error_type, "overloaded_error");
                assert_eq!(err.message, "Overloaded");
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_delta_types_do_not_fail() {
        let body = "event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"thinking_delta\",\"thinking\":\"hmm\"}}\n\n";
        let mut events = parse_sse_stream(sse_response(body).await);

        assert!(matches!(
            events.next().await.unwrap().unwrap(),
            StreamEvent::ContentBlockDelta(ContentBlockDelta {
                delta: Delta::Unsupported,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_parses_stop_reason_from_message_delta() {
        let body = "event: message_delta\ndata: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"max_tokens\",\"stop_sequence\":null},\"usage\":{\"output_tokens\":1024}}\n\n";
        let mut events = parse_sse_stream(sse_response(body).await);

        match events.next().await.unwrap().unwrap() {
            StreamEvent::MessageDelta(delta) => {
                assert_eq!(delta.delta.stop_reason.as_deref(), Some("max_tokens"));
            }
            other => panic!("expected message_delta, got {other:?}"),
        }
    }
}
