//! Demo handlers: the mock streaming model and the `/context` task.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::{Stream, stream};
use rand::Rng;
use std::{convert::Infallible, sync::Arc, time::Duration};
use tollgate_admission::UsageReporter;
use tollgate_stream::{ChatChunk, MESSAGE_EVENT, SseEvent, TokenUsage, USAGE_EVENT};
use tracing::{debug, error};

/// What the mock model says and how fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatScript {
    /// Message chunks, sent in order.
    pub chunks: Vec<String>,
    /// Shortest pause before each chunk.
    pub min_delay: Duration,
    /// Longest pause before each chunk.
    pub max_delay: Duration,
    /// Prompt tokens charged per conversation.
    pub prompt_tokens: u64,
    /// Completion tokens charged per chunk.
    pub tokens_per_chunk: u64,
}

impl Default for ChatScript {
    fn default() -> Self {
        Self {
            chunks: [
                "Hello, ",
                "this is ",
                "a simulated ",
                "model reply ",
                "streamed through ",
                "a priced ",
                "gateway.",
            ]
            .map(str::to_owned)
            .to_vec(),
            min_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(150),
            prompt_tokens: 20,
            tokens_per_chunk: 2,
        }
    }
}

impl ChatScript {
    /// A script pausing exactly `delay` before each chunk.
    pub fn fixed(chunks: &[&str], delay: Duration) -> Self {
        Self {
            chunks: chunks.iter().map(|&chunk| chunk.to_owned()).collect(),
            min_delay: delay,
            max_delay: delay,
            ..Self::default()
        }
    }

    /// Usage reported at the end of a full conversation.
    pub fn usage(&self) -> TokenUsage {
        TokenUsage::new(self.prompt_tokens, self.chunks.len() as u64 * self.tokens_per_chunk)
    }

    fn next_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

/// `GET /mcp/chat`: stream the script as server-sent events.
///
/// When mounted behind admission the final usage is also reported through the
/// request's [`UsageReporter`].
pub async fn chat(State(script): State<Arc<ChatScript>>, request: Request) -> Response {
    let reporter = request.extensions().get::<UsageReporter>().cloned();
    debug!(chunks = script.chunks.len(), reporting = reporter.is_some(), "chat started");

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Body::from_stream(chat_events(script, reporter)),
    )
        .into_response()
}

/// Encoded `message` events followed by one `usage` event.
pub fn chat_events(
    script: Arc<ChatScript>,
    reporter: Option<UsageReporter>,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream::unfold(0usize, move |sent| {
        let script = Arc::clone(&script);
        let reporter = reporter.clone();
        async move {
            let event = match script.chunks.get(sent) {
                Some(content) => {
                    tokio::time::sleep(script.next_delay()).await;
                    SseEvent::json(MESSAGE_EVENT, &ChatChunk { content: content.clone() })
                }
                None if sent == script.chunks.len() => {
                    let usage = script.usage();
                    if let Some(reporter) = &reporter {
                        reporter.report(usage.total_tokens);
                    }
                    debug!(total_tokens = usage.total_tokens, "chat finished");
                    SseEvent::json(USAGE_EVENT, &usage)
                }
                None => return None,
            };

            match event {
                Ok(event) => Some((Ok(event.encode()), sent + 1)),
                Err(err) => {
                    error!(%err, "failed to encode chat event");
                    None
                }
            }
        }
    })
}

/// `GET /context`: a short task taking 150 to 250 ms.
///
/// Dropping the future (client gone or deadline hit) stops the work.
pub async fn context() -> &'static str {
    let millis = rand::rng().random_range(150..=250);
    tokio::time::sleep(Duration::from_millis(millis)).await;
    "MCP Task Success"
}

/// `GET /health`.
pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tollgate_stream::EventDecoder;

    async fn decode_all(script: ChatScript, reporter: Option<UsageReporter>) -> Vec<SseEvent> {
        let mut decoder = EventDecoder::new();
        let mut events = Vec::new();
        let mut body = Box::pin(chat_events(Arc::new(script), reporter));
        while let Some(Ok(bytes)) = body.next().await {
            events.extend(decoder.push(&bytes));
        }
        events
    }

    #[test]
    fn test_default_script_usage() {
        let usage = ChatScript::default().usage();
        assert_eq!(usage.prompt_tokens, 20);
        assert_eq!(usage.completion_tokens, 14);
        assert_eq!(usage.total_tokens, 34);
    }

    #[test]
    fn test_delay_within_bounds() {
        let script = ChatScript::default();
        for _ in 0..200 {
            let delay = script.next_delay();
            assert!(delay >= Duration::from_millis(50) && delay <= Duration::from_millis(150));
        }
        assert_eq!(ChatScript::fixed(&["a"], Duration::ZERO).next_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_stream_ends_with_usage() {
        let script = ChatScript::fixed(&["one ", "two"], Duration::ZERO);
        let reporter = UsageReporter::new();

        let events = decode_all(script, Some(reporter.clone())).await;

        assert_eq!(events.len(), 3);
        let first: ChatChunk = events[0].parse_as(MESSAGE_EVENT).unwrap();
        assert_eq!(first.content, "one ");
        let usage: TokenUsage = events[2].parse_as(USAGE_EVENT).unwrap();
        assert_eq!(usage.total_tokens, 24);
        assert_eq!(reporter.get(), Some(24));
    }

    #[tokio::test]
    async fn test_usage_event_without_reporter() {
        let events = decode_all(ChatScript::fixed(&["x"], Duration::ZERO), None).await;
        assert!(events.last().unwrap().is_usage());
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_takes_at_least_150ms() {
        let started = tokio::time::Instant::now();
        assert_eq!(context().await, "MCP Task Success");
        assert!(started.elapsed() >= Duration::from_millis(150));
    }
}
