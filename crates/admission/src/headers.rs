//! Header names and parsing.

use http::{HeaderMap, HeaderName, HeaderValue};
use tollgate_stream::headers as names;

/// Request header carrying the client's bid.
pub const TOKEN_HEADER: HeaderName = HeaderName::from_static(names::TOKEN);

/// Response header carrying the price quoted for the request.
pub const PRICE_HEADER: HeaderName = HeaderName::from_static(names::PRICE);

/// Response header a non-streaming handler may use to report its usage.
pub const USAGE_HEADER: HeaderName = HeaderName::from_static(names::USAGE);

/// The bid of a request. Missing, empty or non-numeric bids are `None`.
pub fn parse_bid(headers: &HeaderMap) -> Option<u64> {
    headers.get(TOKEN_HEADER)?.to_str().ok()?.trim().parse().ok()
}

/// State of the usage header on a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageHeader {
    /// Header not present.
    Absent,
    /// Header parsed as a non-negative integer.
    Valid(u64),
    /// Header present but unusable; holds a printable copy of the raw value.
    Malformed(String),
}

/// Read the usage header of a response.
pub fn parse_usage(headers: &HeaderMap) -> UsageHeader {
    let Some(value) = headers.get(USAGE_HEADER) else {
        return UsageHeader::Absent;
    };
    match value.to_str().ok().and_then(|raw| raw.trim().parse().ok()) {
        Some(usage) => UsageHeader::Valid(usage),
        None => UsageHeader::Malformed(String::from_utf8_lossy(value.as_bytes()).into_owned()),
    }
}

pub(crate) fn price_value(price: u64) -> HeaderValue {
    HeaderValue::from(price)
}
