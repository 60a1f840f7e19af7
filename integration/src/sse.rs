//! Server-Sent Events wire framing (spec §6 "SSE stream (egress)").
//!
//! The HTTP/SSE *framework* is explicitly out of scope (spec §1); this
//! is just the wire format a typed event gets serialized into before
//! being handed to whatever transport layer owns the actual
//! `text/event-stream` response.

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseFrame {
    pub fn new(event: Option<&str>, payload: &impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event: event.map(str::to_string),
            data: serde_json::to_string(payload)?,
            id: None,
        })
    }

    /// Renders the `text/event-stream` frame, including the trailing
    /// blank line that terminates an SSE event.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(event) = &self.event {
            out.push_str("event: ");
            out.push_str(event);
            out.push('\n');
        }
        if let Some(id) = &self.id {
            out.push_str("id: ");
            out.push_str(id);
            out.push('\n');
        }
        for line in self.data.lines() {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_event_and_data_lines() {
        let frame = SseFrame::new(Some("order_filled"), &json!({"a": 1})).unwrap();
        let rendered = frame.render();
        assert!(rendered.starts_with("event: order_filled\n"));
        assert!(rendered.contains("data: {\"a\":1}\n"));
        assert!(rendered.ends_with("\n\n"));
    }
}
