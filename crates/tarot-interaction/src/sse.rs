//! Server-sent events decoding for streamed completions.
//!
//! Network chunks are split at arbitrary byte offsets, including inside a
//! multi-byte UTF-8 character. The decoder buffers raw bytes and only
//! converts complete lines, so no character is ever torn apart.

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::collections::VecDeque;
use tarot_core::error::BackendError;
use tarot_core::ports::TextStream;

/// Incremental SSE line decoder yielding the `data` payload of each event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            self.process_line(&line, &mut events);
        }

        events
    }

    /// Flushes whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.process_line(&line, &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn process_line(&mut self, line: &[u8], events: &mut Vec<String>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }

        let text = String::from_utf8_lossy(line);
        if let Some(data) = text.strip_prefix("data:") {
            let data = data.strip_prefix(' ').unwrap_or(data);
            self.data_lines.push(data.to_string());
        }
        // Comments (":") and other fields (event/id/retry) are ignored.
    }

    fn dispatch(&mut self, events: &mut Vec<String>) {
        if !self.data_lines.is_empty() {
            events.push(self.data_lines.join("\n"));
            self.data_lines.clear();
        }
    }
}

/// Turns an event payload into a text fragment.
///
/// `Ok(None)` means the event carried nothing to show; `Err` ends the stream.
pub type PayloadParser = fn(&str) -> Result<Option<String>, BackendError>;

struct DecodeState {
    inner: BoxStream<'static, Result<Vec<u8>, String>>,
    decoder: SseDecoder,
    parse: PayloadParser,
    pending: VecDeque<Result<String, BackendError>>,
    finished: bool,
}

impl DecodeState {
    fn push_payloads(&mut self, payloads: Vec<String>) {
        for payload in payloads {
            match (self.parse)(&payload) {
                Ok(Some(text)) if !text.is_empty() => self.pending.push_back(Ok(text)),
                Ok(_) => {}
                Err(err) => {
                    self.pending.push_back(Err(err));
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

/// Decodes a raw SSE byte stream into a [`TextStream`].
///
/// The resulting stream ends after the first error.
pub fn decode_text_stream(
    inner: BoxStream<'static, Result<Vec<u8>, String>>,
    parse: PayloadParser,
) -> TextStream {
    let state = DecodeState {
        inner,
        decoder: SseDecoder::new(),
        parse,
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.feed(&chunk);
                    state.push_payloads(payloads);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    state.pending.push_back(Err(BackendError::Stream(err)));
                }
                None => {
                    let payloads = state.decoder.finish();
                    state.push_payloads(payloads);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
