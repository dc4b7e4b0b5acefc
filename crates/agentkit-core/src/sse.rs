// SPDX-License-Identifier: MIT OR Apache-2.0
//! Incremental server-sent-events parsing.
//!
//! Both vendor transports stream `event:` / `data:` frames separated by blank
//! lines. [`SseParser`] accepts arbitrary text chunks and yields complete
//! [`SseEvent`]s; [`sse_events`] adapts a `reqwest` response body into a
//! stream of them.

use std::pin::Pin;

use agentkit_error::{AgentkitError, ErrorCode, Result};
use futures::{Stream, StreamExt};

/// One dispatched SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    /// Joined `data:` lines.
    pub data: String,
}

/// Incremental SSE frame parser.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Create an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of text; returns the frames completed by it.
    pub fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(ev) = self.parse_line(line.trim_end_matches(['\n', '\r'])) {
                out.push(ev);
            }
        }
        out
    }

    /// Flush a trailing frame that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        if !rest.is_empty() {
            let _ = self.parse_line(rest.trim_end_matches('\r'));
        }
        self.dispatch()
    }

    fn parse_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => self.data.push(value.to_owned()),
            _ => tracing::trace!(target: "agentkit.core", line, "ignoring SSE field"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() {
            self.event = None;
            return None;
        }
        Some(SseEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// Boxed stream of parsed frames.
pub type SseStream = Pin<Box<dyn Stream<Item = Result<SseEvent>> + Send>>;

struct BodyState<S> {
    body: S,
    parser: SseParser,
    carry: Vec<u8>,
    pending: std::collections::VecDeque<SseEvent>,
    done: bool,
}

/// Turn a streaming HTTP response body into SSE frames.
pub fn sse_events(response: reqwest::Response) -> SseStream {
    let state = BodyState {
        body: Box::pin(response.bytes_stream()),
        parser: SseParser::new(),
        carry: Vec::new(),
        pending: Default::default(),
        done: false,
    };
    let stream = futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(ev) = st.pending.pop_front() {
                return Some((Ok(ev), st));
            }
            if st.done {
                return None;
            }
            match st.body.next().await {
                Some(Ok(bytes)) => {
                    st.carry.extend_from_slice(&bytes);
                    // Keep an incomplete UTF-8 sequence for the next chunk.
                    let valid = match std::str::from_utf8(&st.carry) {
                        Ok(_) => st.carry.len(),
                        Err(e) => e.valid_up_to(),
                    };
                    let text = String::from_utf8_lossy(&st.carry[..valid]).into_owned();
                    st.carry.drain(..valid);
                    st.pending.extend(st.parser.push(&text));
                }
                Some(Err(e)) => {
                    st.done = true;
                    let err = AgentkitError::new(
                        ErrorCode::VendorTransport,
                        format!("stream read failed: {e}"),
                    )
                    .with_source(e);
                    return Some((Err(err), st));
                }
                None => {
                    st.done = true;
                    if !st.carry.is_empty() {
                        let rest = String::from_utf8_lossy(&st.carry).into_owned();
                        st.carry.clear();
                        st.pending.extend(st.parser.push(&rest));
                    }
                    st.pending.extend(st.parser.finish());
                }
            }
        }
    });
    Box::pin(stream)
}
