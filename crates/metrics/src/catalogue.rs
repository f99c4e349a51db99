//! Metric names and recording helpers.
//!
//! Every metric Tollgate emits is defined here so names and labels stay in one
//! place. Names are unprefixed; the installed recorder adds the configured prefix.

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};

/// Admission decisions, labelled by `status` and `resource`.
pub const REQUESTS_TOTAL: &str = "requests_total";
/// Malformed `X-Token-Usage` values, labelled by `resource`.
pub const USAGE_PARSE_ERRORS_TOTAL: &str = "usage_parse_errors_total";
/// Admitted request duration until the response body completes.
pub const REQUEST_DURATION_SECONDS: &str = "request_duration_seconds";
/// Work units reported by admitted requests.
pub const TOKEN_USAGE: &str = "token_usage";
/// Current price per resource.
pub const PRICE: &str = "price";
/// Current composite cost estimate per resource.
pub const COMPOSITE_COST: &str = "composite_cost";
/// Client bid decisions, labelled by `outcome`.
pub const CLIENT_BIDS_TOTAL: &str = "client_bids_total";

/// Register descriptions with the global recorder.
pub fn describe() {
    describe_counter!(REQUESTS_TOTAL, "Admission decisions by status and resource");
    describe_counter!(USAGE_PARSE_ERRORS_TOTAL, "Usage header values that failed to parse");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of admitted requests, measured until the response body completes"
    );
    describe_histogram!(TOKEN_USAGE, "Work units consumed by admitted requests");
    describe_gauge!(PRICE, "Current admission price per resource");
    describe_gauge!(COMPOSITE_COST, "Weighted latency and usage estimate per resource");
    describe_counter!(CLIENT_BIDS_TOTAL, "Client bid decisions by outcome");
}

/// Gateway-side admission metrics.
pub mod admission {
    use super::*;
    use metrics::{counter, histogram};

    /// Outcome of an admission decision.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Outcome {
        /// Bid covered the price; the handler ran.
        Accepted,
        /// No usable `Token` header.
        RejectedNoToken,
        /// Bid below the current price.
        RejectedPrice,
    }

    impl Outcome {
        /// Value of the `status` label.
        pub const fn as_str(&self) -> &'static str {
            match self {
                Self::Accepted => "accepted",
                Self::RejectedNoToken => "rejected_no_token",
                Self::RejectedPrice => "rejected_price",
            }
        }
    }

    /// Count one admission decision.
    pub fn record_outcome(resource: &str, outcome: Outcome) {
        counter!(REQUESTS_TOTAL, "status" => outcome.as_str(), "resource" => resource.to_owned())
            .increment(1);
    }

    /// Count a usage header that could not be parsed.
    pub fn usage_parse_error(resource: &str) {
        counter!(USAGE_PARSE_ERRORS_TOTAL, "resource" => resource.to_owned()).increment(1);
    }

    /// Record the full duration of an admitted request.
    pub fn observe_duration(resource: &str, seconds: f64) {
        histogram!(REQUEST_DURATION_SECONDS, "resource" => resource.to_owned()).record(seconds);
    }

    /// Record the usage reported by an admitted request.
    pub fn observe_usage(resource: &str, usage: u64) {
        histogram!(TOKEN_USAGE, "resource" => resource.to_owned()).record(usage as f64);
    }
}

/// Price controller gauges.
pub mod pricing {
    use super::*;
    use metrics::gauge;

    /// Set the current price of a resource.
    pub fn set_price(resource: &str, price: u64) {
        gauge!(PRICE, "resource" => resource.to_owned()).set(price as f64);
    }

    /// Set the current composite cost of a resource.
    pub fn set_composite_cost(resource: &str, composite: f64) {
        gauge!(COMPOSITE_COST, "resource" => resource.to_owned()).set(composite);
    }
}

/// Client-side bidding metrics.
pub mod client {
    use super::*;
    use metrics::counter;

    /// Count a bid decision (`submitted`, `empty_wallet`, `below_last_price`, ...).
    pub fn record_bid(outcome: &'static str) {
        counter!(CLIENT_BIDS_TOTAL, "outcome" => outcome).increment(1);
    }
}
