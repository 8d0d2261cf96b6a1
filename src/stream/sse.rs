//! Incremental `text/event-stream` decoder
//!
//! Bytes arrive in arbitrary chunks; lines and UTF-8 sequences may be split
//! anywhere. Only unnamed events (or `event: message`) are delivered, which
//! is what a browser `EventSource.onmessage` handler would see.

use std::collections::VecDeque;

use futures::{Stream, StreamExt};
use tracing::debug;

use super::errors::SearchError;
use super::MessageStream;

/// Stateful SSE frame decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: String,
    has_data: bool,
    event: Option<String>,
    // Last byte was '\r'; a following '\n' belongs to the same line ending
    skip_lf: bool,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every payload it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut payloads = Vec::new();
        for &byte in chunk {
            if self.skip_lf {
                self.skip_lf = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\n' => self.end_line(&mut payloads),
                b'\r' => {
                    self.end_line(&mut payloads);
                    self.skip_lf = true;
                }
                _ => self.line.push(byte),
            }
        }
        payloads
    }

    /// Signal end of input.
    ///
    /// A frame that was never terminated by a blank line is discarded.
    /// Returns `true` if anything was discarded.
    pub fn finish(&mut self) -> bool {
        let discarded = self.has_data || !self.line.is_empty();
        if discarded {
            debug!(
                pending_bytes = self.line.len() + self.data.len(),
                "Discarding unterminated SSE frame at end of stream"
            );
        }
        *self = Self::default();
        discarded
    }

    fn end_line(&mut self, payloads: &mut Vec<String>) {
        let raw = std::mem::take(&mut self.line);
        let line = String::from_utf8_lossy(&raw);

        if line.is_empty() {
            self.dispatch(payloads);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };

        match field {
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "event" => self.event = Some(value.to_string()),
            // id and retry only matter for reconnection, which is never attempted
            _ => {}
        }
    }

    fn dispatch(&mut self, payloads: &mut Vec<String>) {
        let event = self.event.take();
        if !self.has_data {
            return;
        }
        self.has_data = false;
        let data = std::mem::take(&mut self.data);

        match event.as_deref() {
            None | Some("") | Some("message") => payloads.push(data),
            Some(name) => debug!(event = name, "Skipping named SSE event"),
        }
    }
}

/// Turn a byte stream into a stream of SSE payloads.
///
/// A transport error is yielded once and ends the stream. Payloads already
/// decoded before the error are delivered first.
pub fn decode_event_stream<S, B, E>(bytes: S) -> MessageStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<SearchError> + Send + 'static,
{
    struct State<S> {
        bytes: std::pin::Pin<Box<S>>,
        decoder: SseDecoder,
        ready: VecDeque<String>,
        done: bool,
    }

    let state = State {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.ready.pop_front() {
                return Some((Ok(payload), state));
            }
            if state.done {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => state.ready.extend(state.decoder.feed(chunk.as_ref())),
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.decoder.finish();
                    state.done = true;
                }
            }
        }
    })
    .boxed()
}
