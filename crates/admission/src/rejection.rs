//! Responses for requests that do not reach the handler.

use crate::headers::{PRICE_HEADER, price_value};
use axum::{
    body::Body,
    response::{IntoResponse, Response},
};
use http::StatusCode;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No usable `Token` header.
    NoToken,
    /// The bid does not cover the current price.
    PriceAboveBid { bid: u64, price: u64 },
    /// The handler did not respond before the deadline.
    DeadlineExceeded,
}

impl Rejection {
    /// Status code sent to the client.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoToken => StatusCode::FORBIDDEN,
            Self::PriceAboveBid { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Plain-text body sent to the client.
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NoToken => "No Token",
            Self::PriceAboveBid { .. } => "System is busy (Price > Token)",
            Self::DeadlineExceeded => "Request deadline exceeded",
        }
    }

    /// Build the response, tagged with the price quoted for the request.
    pub fn into_priced_response(self, price: u64) -> Response<Body> {
        (self.status(), [(PRICE_HEADER, price_value(price))], self.message()).into_response()
    }
}
