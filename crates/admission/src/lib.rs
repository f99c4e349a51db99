//! Price-gated admission control.
//!
//! [`AdmissionLayer`] wraps a service and, per request:
//!
//! 1. quotes the current price of the resource in a `Price` response header,
//! 2. rejects requests without a `Token` bid (403) or bidding below the price (429),
//! 3. runs admitted requests with a [`UsageReporter`] in their extensions,
//! 4. once the response body has been fully sent (or abandoned), feeds the elapsed
//!    time and reported usage back into the [`Pricer`](tollgate_pricing::Pricer).
//!
//! Streaming handlers learn their cost only after the first bytes have gone out,
//! which is why the observation is tied to the end of the body and not to the
//! handler returning.

mod body;
mod guard;
mod headers;
mod layer;
mod rejection;
mod usage;

pub use body::MeteredBody;
pub use headers::{PRICE_HEADER, TOKEN_HEADER, USAGE_HEADER, UsageHeader, parse_bid, parse_usage};
pub use layer::{AdmissionLayer, AdmissionService};
pub use rejection::Rejection;
pub use usage::UsageReporter;
