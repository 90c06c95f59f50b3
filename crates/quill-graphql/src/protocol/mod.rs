//! Protocol-level pieces: operation documents and the SSE stream parser.

pub mod documents;
pub mod sse;

pub use documents::*;
pub use sse::{SseEvent, SseParser};
