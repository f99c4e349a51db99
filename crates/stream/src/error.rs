//! Stream errors.

/// Errors decoding or encoding event payloads.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The `data` field is not the expected JSON.
    #[error("invalid event payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The event carries a different type than requested.
    #[error("expected `{expected}` event, got `{actual}`")]
    UnexpectedEvent { expected: &'static str, actual: String },
}
