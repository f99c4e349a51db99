//! Response body that reports completion to the observation guard.

use crate::guard::ObservationGuard;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::time::{Instant, Sleep};
use tracing::warn;

pin_project! {
    /// Wraps an admitted response body.
    ///
    /// The request is observed when the body yields its last frame, fails, hits
    /// the deadline, or is dropped before completion.
    pub struct MeteredBody<B> {
        #[pin]
        inner: B,
        guard: ObservationGuard,
        deadline: Option<Pin<Box<Sleep>>>,
        timed_out: bool,
    }
}

impl<B> MeteredBody<B> {
    pub(crate) fn new(inner: B, guard: ObservationGuard, deadline: Option<Instant>) -> Self {
        Self {
            inner,
            guard,
            deadline: deadline.map(|at| Box::pin(tokio::time::sleep_until(at))),
            timed_out: false,
        }
    }
}

impl<B: Body> Body for MeteredBody<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        if *this.timed_out {
            return Poll::Ready(None);
        }

        if let Some(deadline) = this.deadline.as_mut()
            && deadline.as_mut().poll(cx).is_ready()
        {
            warn!("deadline reached while streaming, truncating response");
            *this.timed_out = true;
            this.guard.finish();
            return Poll::Ready(None);
        }

        let polled = this.inner.poll_frame(cx);
        if let Poll::Ready(None) | Poll::Ready(Some(Err(_))) = &polled {
            this.guard.finish();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.timed_out || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        if self.timed_out {
            return SizeHint::with_exact(0);
        }
        self.inner.size_hint()
    }
}
