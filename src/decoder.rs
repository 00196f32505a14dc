//! Incremental UTF-8 decoding for byte chunks that may split characters.

use encoding_rs::{CoderResult, Decoder, UTF_8};

/// Stateful UTF-8 decoder fed one network chunk at a time.
///
/// A multi-byte character cut by a chunk boundary is held back until the
/// next chunk completes it, so `decode(a) + decode(b)` always equals the
/// one-shot decoding of `a ++ b`. Invalid sequences become U+FFFD and a
/// leading byte-order mark is dropped, the same way a browser text decoder
/// in streaming mode behaves.
pub struct Utf8StreamDecoder {
    decoder: Decoder,
    finished: bool,
}

impl Default for Utf8StreamDecoder {
    fn default() -> Self {
        Utf8StreamDecoder {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            finished: false,
        }
    }
}

impl std::fmt::Debug for Utf8StreamDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Utf8StreamDecoder")
            .field("finished", &self.finished)
            .finish()
    }
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.run(chunk, false)
    }

    /// Flush at end of stream. A dangling partial sequence becomes one U+FFFD.
    /// Calls after the first return an empty string.
    pub fn finish(&mut self) -> String {
        if self.finished {
            return String::new();
        }
        let tail = self.run(&[], true);
        self.finished = true;
        tail
    }

    fn run(&mut self, mut input: &[u8], last: bool) -> String {
        let mut out = String::new();
        if self.finished {
            return out;
        }
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len() * 3 + 4);
            out.reserve(needed);
            let (result, read, _) = self.decoder.decode_to_string(input, &mut out, last);
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
        out
    }
}
