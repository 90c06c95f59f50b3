//! Incremental parser for `text/event-stream` bodies.
//!
//! Subscriptions arrive as a long-lived streamed body. Chunks can split
//! events (and lines) anywhere, so the parser buffers until a blank line
//! terminates an event.

use bytes::{Buf, BytesMut};

/// Event name carrying a GraphQL execution result.
pub const EVENT_NEXT: &str = "next";
/// Event name signalling the server finished the operation.
pub const EVENT_COMPLETE: &str = "complete";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field; `message` when absent.
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    pub fn is_next(&self) -> bool {
        self.event == EVENT_NEXT || self.event == "message"
    }

    pub fn is_complete(&self) -> bool {
        self.event == EVENT_COMPLETE
    }
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: BytesMut,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    heartbeats: u64,
}

impl SseParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            ..Default::default()
        }
    }

    /// Number of comment lines seen so far (servers use them as keep-alives).
    pub fn heartbeats(&self) -> u64 {
        self.heartbeats
    }

    pub fn feed(&mut self, data: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(data);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw = self.buffer.split_to(pos);
            self.buffer.advance(1);
            let decoded = String::from_utf8_lossy(&raw);
            let line: &str = decoded.strip_suffix('\r').unwrap_or(&decoded);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                self.heartbeats += 1;
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                "id" => self.id = Some(value.to_string()),
                // `retry` and unknown fields are ignored
                _ => {}
            }
        }

        events
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let id = self.id.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
            id,
        })
    }
}
