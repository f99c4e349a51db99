//! Incremental event-stream decoder.

use crate::SseEvent;
use tracing::warn;

/// Longest line kept while waiting for its terminator.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Turns arbitrarily split chunks of an event stream into events.
///
/// Lines may be terminated by `\n` or `\r\n`. Bytes of an unfinished line are
/// kept until the rest arrives, so multi-byte characters split across chunks
/// decode correctly. A line longer than [`MAX_LINE_LEN`] is dropped.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    /// Skipping the rest of an oversized line.
    discarding: bool,
    event: Option<String>,
    data: Vec<String>,
}

impl EventDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer.get(start..).and_then(find_newline) {
            let end = start + offset;
            if std::mem::take(&mut self.discarding) {
                start = end + 1;
                continue;
            }
            let line = self.buffer.get(start..end).unwrap_or_default();
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let line = String::from_utf8_lossy(line).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        if self.buffer.len() > MAX_LINE_LEN {
            if !self.discarding {
                warn!(pending = self.buffer.len(), "event stream line too long, dropping it");
            }
            self.buffer.clear();
            self.discarding = true;
        }

        events
    }

    /// Flush an event left open when the stream ended without a blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if std::mem::take(&mut self.discarding) {
            self.buffer.clear();
        } else if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => self.data.push(value.to_owned()),
            // id and retry carry nothing we use
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() && self.event.is_none() {
            return None;
        }
        let event = SseEvent { event: self.event.take(), data: self.data.join("\n") };
        self.data.clear();
        Some(event)
    }
}

fn find_newline(haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|&b| b == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = "event: message\ndata: {\"content\":\"a\"}\n\n\
                          event: usage\n\
                          data: {\"prompt_tokens\":20,\"completion_tokens\":2,\
                          \"total_tokens\":22}\n\n";

    #[test]
    fn test_decodes_whole_stream() {
        let mut decoder = EventDecoder::new();
        let events = decoder.push(STREAM.as_bytes());

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), "message");
        assert_eq!(events[0].data, "{\"content\":\"a\"}");
        assert!(events[1].is_usage());
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_decodes_byte_by_byte() {
        let mut decoder = EventDecoder::new();
        let events: Vec<_> =
            STREAM.as_bytes().iter().flat_map(|b| decoder.push(std::slice::from_ref(b))).collect();
        assert_eq!(events.len(), 2);
        assert!(events[1].is_usage());
    }

    #[test]
    fn test_crlf_comments_and_multiline() {
        let mut decoder = EventDecoder::new();
        let events = decoder.push(b": keep-alive\r\ndata: one\r\ndata:two\r\n\r\n");
        assert_eq!(events, vec![SseEvent { event: None, data: "one\ntwo".into() }]);
    }

    #[test]
    fn test_split_utf8_character() {
        let mut decoder = EventDecoder::new();
        let bytes = "data: caf\u{e9}\n\n".as_bytes();
        let (head, tail) = bytes.split_at(10);
        assert!(decoder.push(head).is_empty());
        let events = decoder.push(tail);
        assert_eq!(events[0].data, "caf\u{e9}");
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.push(b"event: usage\ndata: {}").is_empty());
        let event = decoder.finish().unwrap();
        assert!(event.is_usage());
        assert_eq!(event.data, "{}");
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.push(b"event: message\ndata: ").is_empty());

        let filler = vec![b'x'; MAX_LINE_LEN / 2 + 1];
        for _ in 0..4 {
            assert!(decoder.push(&filler).is_empty());
            assert!(decoder.buffer.len() <= MAX_LINE_LEN);
        }

        let events = decoder.push(b"xxx\n\nevent: usage\ndata: {}\n\n");
        assert_eq!(
            events,
            vec![
                SseEvent { event: Some("message".into()), data: String::new() },
                SseEvent { event: Some("usage".into()), data: "{}".into() },
            ]
        );
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_finish_drops_oversized_tail() {
        let mut decoder = EventDecoder::new();
        decoder.push(b"data: kept\n");
        decoder.push(&vec![b'x'; MAX_LINE_LEN + 1]);
        assert_eq!(decoder.finish(), Some(SseEvent { event: None, data: "kept".into() }));
    }
}
