//! Header names shared by the gateway and its clients.

/// Request header carrying the client's bid.
pub const TOKEN: &str = "token";

/// Response header carrying the price quoted for the request.
pub const PRICE: &str = "price";

/// Response header a non-streaming handler may use to report its usage.
pub const USAGE: &str = "x-token-usage";
