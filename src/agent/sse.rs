//! Incremental decoder for upstream `text/event-stream` bodies
//!
//! Bytes arrive in arbitrary chunks from the HTTP client. The decoder keeps
//! an undecoded byte buffer so that events split across chunks (including
//! split UTF-8 sequences) are reassembled before being parsed.

use crate::error::{ChatError, Result};

/// Upstream end-of-stream marker used by OpenAI-compatible APIs
pub const DONE_MARKER: &str = "[DONE]";

/// Largest pending (unterminated) event the decoder will hold
pub const MAX_PENDING_BYTES: usize = 1024 * 1024;

/// Buffers raw bytes and yields the `data` payload of each complete event
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Offset up to which `buffer` is known to hold no event boundary
    scanned: usize,
    limit: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            limit,
        }
    }

    /// Feed a chunk and return the data payloads of all events it completed.
    ///
    /// Multi-line `data:` fields are joined with `\n`; comments and other
    /// fields (`event:`, `id:`, `retry:`) are ignored. Fails with
    /// `AdapterProtocol` once the pending event grows past the limit.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        // A separator may straddle the previous chunk boundary
        let mut from = self.scanned.saturating_sub(3);
        while let Some((end, sep_len)) = find_event_boundary(&self.buffer, from) {
            let raw: Vec<u8> = self.buffer.drain(..end + sep_len).take(end).collect();
            if let Some(data) = parse_event(&String::from_utf8_lossy(&raw)) {
                payloads.push(data);
            }
            from = 0;
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.limit {
            let pending = self.buffer.len();
            self.buffer.clear();
            self.scanned = 0;
            return Err(ChatError::AdapterProtocol(format!(
                "SSE event exceeds {} bytes without a terminating blank line (got {pending})",
                self.limit
            )));
        }
        Ok(payloads)
    }

    /// Payload of a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        parse_event(&String::from_utf8_lossy(&raw))
    }
}

/// Locate the first blank line at or after `from`, accepting `\n\n` and `\r\n\r\n`.
fn find_event_boundary(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    let tail = buf.get(from..)?;
    let lf = tail.windows(2).position(|w| w == b"\n\n").map(|i| (from + i, 2));
    let crlf = tail
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (from + i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn parse_event(event: &str) -> Option<String> {
    let mut data: Option<String> = None;
    for line in event.lines() {
        let line = line.trim_end_matches('\r');
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match data.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }
    data
}
