//! Line framing over a chunked byte stream.

use std::collections::VecDeque;
use std::time::Duration;

use tokio_stream::{Stream, StreamExt};

use crate::decoder::Utf8StreamDecoder;
use crate::error::{Result, StreamError};

/// Holds the unterminated tail between chunks.
///
/// After every `push` the buffer contains at most one partial line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text and return every line it completed, in order.
    /// The `\n` delimiter is not part of the returned lines.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        let mut lines = Vec::new();
        while let Some(line_end) = self.buffer.find('\n') {
            lines.push(self.buffer[..line_end].to_string());
            self.buffer.drain(..=line_end);
        }
        lines
    }

    /// Take the residual partial line, if it is non-empty.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// Pull-based line reader over a stream of byte chunks.
///
/// Lines are produced lazily: a chunk is only pulled when every line from
/// the previous chunk has been handed out. Once the underlying stream ends
/// the reader yields the flushed remainder and then `None` forever.
pub struct LineReader<S> {
    chunks: S,
    decoder: Utf8StreamDecoder,
    buffer: LineBuffer,
    ready: VecDeque<String>,
    done: bool,
    idle_timeout: Option<Duration>,
}

impl<S, B, E> LineReader<S>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    StreamError: From<E>,
{
    pub fn new(chunks: S) -> Self {
        LineReader {
            chunks,
            decoder: Utf8StreamDecoder::new(),
            buffer: LineBuffer::new(),
            ready: VecDeque::new(),
            done: false,
            idle_timeout: None,
        }
    }

    /// Fail with [`StreamError::IdleTimeout`] when a single chunk takes longer than `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }
            if self.done {
                return Ok(None);
            }

            let next = match self.idle_timeout {
                Some(limit) => tokio::time::timeout(limit, self.chunks.next())
                    .await
                    .map_err(|_| StreamError::IdleTimeout(limit.as_secs()))?,
                None => self.chunks.next().await,
            };

            match next {
                Some(chunk) => {
                    let chunk = chunk?;
                    let text = self.decoder.decode(chunk.as_ref());
                    self.ready.extend(self.buffer.push(&text));
                }
                None => {
                    self.done = true;
                    let tail = self.decoder.finish();
                    self.ready.extend(self.buffer.push(&tail));
                    if let Some(rest) = self.buffer.finish() {
                        self.ready.push_back(rest);
                    }
                }
            }
        }
    }

    /// Drain every remaining line. Convenience for callers that do not need
    /// to interleave rendering with reading.
    pub async fn collect_lines(mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line().await? {
            lines.push(line);
        }
        Ok(lines)
    }
}
