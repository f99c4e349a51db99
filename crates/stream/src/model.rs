//! Payloads carried by the chat stream.

use serde::{Deserialize, Serialize};

/// Event type of a content chunk.
pub const MESSAGE_EVENT: &str = "message";

/// Event type of the final usage report.
pub const USAGE_EVENT: &str = "usage";

/// One piece of generated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChunk {
    pub content: String,
}

/// Token accounting sent after the last chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Usage with `total_tokens` derived from the parts.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self { prompt_tokens, completion_tokens, total_tokens: prompt_tokens + completion_tokens }
    }
}
