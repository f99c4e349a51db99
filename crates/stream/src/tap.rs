//! Observe usage reports in a byte stream without altering it.

use crate::{EventDecoder, SseEvent, TokenUsage, USAGE_EVENT};
use futures::Stream;
use pin_project_lite::pin_project;
use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};
use tracing::warn;

pin_project! {
    /// Forwards an event-stream body unchanged and calls `on_usage` for every
    /// `usage` event that passes through.
    pub struct UsageTap<S, F> {
        #[pin]
        inner: S,
        decoder: EventDecoder,
        on_usage: F,
    }
}

impl<S, F> UsageTap<S, F> {
    /// Wrap `inner`.
    pub fn new(inner: S, on_usage: F) -> Self {
        Self { inner, decoder: EventDecoder::new(), on_usage }
    }
}

fn inspect<F: FnMut(TokenUsage)>(event: SseEvent, on_usage: &mut F) {
    if !event.is_usage() {
        return;
    }
    match event.parse_as::<TokenUsage>(USAGE_EVENT) {
        Ok(usage) => on_usage(usage),
        Err(err) => warn!(%err, data = %event.data, "ignoring malformed usage event"),
    }
}

impl<S, B, E, F> Stream for UsageTap<S, F>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    F: FnMut(TokenUsage),
{
    type Item = Result<B, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                for event in this.decoder.push(chunk.as_ref()) {
                    inspect(event, this.on_usage);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(err)) => Poll::Ready(Some(Err(err))),
            None => {
                if let Some(event) = this.decoder.finish() {
                    inspect(event, this.on_usage);
                }
                Poll::Ready(None)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
