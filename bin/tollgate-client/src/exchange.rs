//! One priced request and its streamed reply.

use futures::StreamExt;
use reqwest::{Client, StatusCode, header::ACCEPT};
use std::time::{Duration, Instant};
use tollgate_stream::{
    ChatChunk, EventDecoder, MESSAGE_EVENT, SseEvent, TokenUsage, USAGE_EVENT, headers,
};
use tracing::{trace, warn};
use url::Url;

/// Outcome of a single request.
#[derive(Debug)]
pub(crate) struct Exchange {
    pub(crate) status: StatusCode,
    /// Price quoted by the gateway, if it sent one.
    pub(crate) price: Option<u64>,
    pub(crate) usage: Option<TokenUsage>,
    pub(crate) messages: usize,
    pub(crate) elapsed: Duration,
}

impl Exchange {
    fn observe(&mut self, event: SseEvent) {
        if event.is_usage() {
            match event.parse_as::<TokenUsage>(USAGE_EVENT) {
                Ok(usage) => self.usage = Some(usage),
                Err(err) => warn!(%err, "malformed usage event"),
            }
            return;
        }

        match event.parse_as::<ChatChunk>(MESSAGE_EVENT) {
            Ok(chunk) => {
                self.messages += 1;
                trace!(content = %chunk.content, "message");
            }
            Err(err) => trace!(%err, kind = event.kind(), "skipping event"),
        }
    }
}

/// Send `bid` to `target` and consume the whole response.
pub(crate) async fn send(
    client: &Client,
    target: &Url,
    bid: u64,
) -> Result<Exchange, reqwest::Error> {
    let started = Instant::now();
    let response = client
        .get(target.clone())
        .header(headers::TOKEN, bid)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await?;

    let mut exchange = Exchange {
        status: response.status(),
        price: response
            .headers()
            .get(headers::PRICE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok()),
        usage: None,
        messages: 0,
        elapsed: Duration::ZERO,
    };

    let mut decoder = EventDecoder::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if exchange.status.is_success() {
            for event in decoder.push(&chunk) {
                exchange.observe(event);
            }
        }
    }
    if let Some(event) = decoder.finish() {
        exchange.observe(event);
    }

    exchange.elapsed = started.elapsed();
    Ok(exchange)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Exchange {
        Exchange {
            status: StatusCode::OK,
            price: None,
            usage: None,
            messages: 0,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_observe_counts_messages_and_usage() {
        let mut exchange = empty();
        let chunk = ChatChunk { content: "hi".into() };
        exchange.observe(SseEvent::json(MESSAGE_EVENT, &chunk).unwrap());
        exchange.observe(SseEvent::json(MESSAGE_EVENT, &chunk).unwrap());
        exchange.observe(SseEvent::json(USAGE_EVENT, &TokenUsage::new(20, 4)).unwrap());

        assert_eq!(exchange.messages, 2);
        assert_eq!(exchange.usage.map(|usage| usage.total_tokens), Some(24));
    }

    #[test]
    fn test_observe_ignores_garbage() {
        let mut exchange = empty();
        exchange.observe(SseEvent { event: Some(USAGE_EVENT.into()), data: "{".into() });
        exchange.observe(SseEvent { event: None, data: "plain text".into() });

        assert_eq!(exchange.messages, 0);
        assert!(exchange.usage.is_none());
    }
}
