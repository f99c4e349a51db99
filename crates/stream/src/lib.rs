//! Server-sent events as used between the mock backend, the gateway and clients.
//!
//! Frames look like
//!
//! ```text
//! event: message
//! data: {"content":"..."}
//!
//! event: usage
//! data: {"prompt_tokens":20,"completion_tokens":14,"total_tokens":34}
//!
//! ```

mod decoder;
mod error;
mod event;
pub mod headers;
mod model;
mod tap;

pub use decoder::{EventDecoder, MAX_LINE_LEN};
pub use error::StreamError;
pub use event::SseEvent;
pub use model::{ChatChunk, MESSAGE_EVENT, TokenUsage, USAGE_EVENT};
pub use tap::UsageTap;
