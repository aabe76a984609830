// ABOUTME: Line-buffering SSE (Server-Sent Events) parser for upstream streaming responses
// ABOUTME: Survives lines and multi-byte characters split across TCP chunk boundaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # SSE Stream Parser
//!
//! TCP gives no alignment between network chunks and SSE lines: one chunk may
//! carry several events, and one event may straddle two chunks. The buffer
//! below works on raw bytes and only decodes a line once its terminating `\n`
//! has arrived, so a UTF-8 sequence cut in half is never mangled.

use std::fmt::Display;
use std::mem;

use async_stream::stream;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use relay_core::errors::{AppError, AppResult};

/// A parsed SSE event from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload (prefix stripped)
    Data(String),
    /// The `[DONE]` termination signal
    Done,
}

/// Byte buffer holding at most one incomplete line between feeds
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no `\n`
    scanned: usize,
}

impl SseLineBuffer {
    /// Create a new empty line buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every event completed by it
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(bytes);

        let mut events = Vec::new();
        let mut consumed = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.pending[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + offset;
            if let Some(event) = parse_line(&self.pending[consumed..end]) {
                events.push(event);
            }
            consumed = end + 1;
            search_from = consumed;
        }
        self.pending.drain(..consumed);
        self.scanned = self.pending.len();
        events
    }

    /// Parse whatever is left once the byte stream has ended
    pub fn flush(&mut self) -> Option<SseEvent> {
        let remaining = mem::take(&mut self.pending);
        self.scanned = 0;
        parse_line(&remaining)
    }
}

/// Interpret one line; comments, blank separators and non-data fields yield nothing
fn parse_line(raw: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    let data = line.strip_prefix("data:")?.trim_start();
    match data {
        "" => None,
        "[DONE]" => Some(SseEvent::Done),
        payload => Some(SseEvent::Data(payload.to_owned())),
    }
}

/// Turn a raw byte stream into SSE events
///
/// A transport error ends the stream after one `Err` item naming the provider.
pub fn sse_events<S, E>(byte_stream: S, provider: &'static str) -> impl Stream<Item = AppResult<SseEvent>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    stream! {
        let mut parser = SseLineBuffer::new();
        let mut byte_stream = Box::pin(byte_stream);

        while let Some(chunk) = byte_stream.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in parser.feed(&bytes) {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    yield Err(AppError::external_unavailable(
                        provider,
                        format!("Stream read error: {e}"),
                    ));
                    return;
                }
            }
        }

        if let Some(event) = parser.flush() {
            yield Ok(event);
        }
    }
}
