//! Incremental Server-Sent Events decoder for `streamGenerateContent?alt=sse`.
//!
//! Events are separated by a blank line. Gemini terminates lines with `\r\n`,
//! so carriage returns are dropped before splitting.

/// A single decoded event. Only the `data:` payload matters to Gemini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Buffers partial events across network chunk boundaries. Bytes are kept
/// undecoded until an event is complete so multi-byte characters split
/// between chunks survive.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from the response body. Returns every event completed
    /// by this chunk, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(boundary) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..boundary + 2).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }

    /// Decode whatever is left once the body has ended without a trailing
    /// blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_block(&String::from_utf8_lossy(&rest))
    }
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in block.lines() {
        if let Some(val) = line.strip_prefix("event:") {
            event = Some(val.trim().to_string());
        } else if let Some(val) = line.strip_prefix("data:") {
            data_lines.push(val.strip_prefix(' ').unwrap_or(val));
        }
        // id:, retry: and ":" comments are ignored
    }

    if data_lines.is_empty() {
        return None;
    }
    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_sse() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: hello\n\ndata: world\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "hello");
        assert_eq!(events[1].data, "world");
    }

    #[test]
    fn test_crlf_separators() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: {\"a\":1}\r\n\r\ndata: {\"a\":2}\r\n\r\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].data, "{\"a\":2}");
    }

    #[test]
    fn test_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: hel").is_empty());
        let events = parser.feed(b"lo\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hello");
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let bytes = "data: 头痛\n\n".as_bytes();
        let mut parser = SseParser::new();
        assert!(parser.feed(&bytes[..8]).is_empty());
        let events = parser.feed(&bytes[8..]);
        assert_eq!(events[0].data, "头痛");
    }

    #[test]
    fn test_comments_and_event_names() {
        let mut parser = SseParser::new();
        let events = parser.feed(b": keepalive\n\nevent: message\ndata: x\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.as_deref(), Some("message"));
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: tail").is_empty());
        assert_eq!(parser.finish().map(|e| e.data), Some("tail".to_string()));
        assert!(parser.finish().is_none());
    }
}
