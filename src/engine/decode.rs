//! Chunk decoding.
//!
//! Reads land on arbitrary byte boundaries. Two things can be cut in half: a UTF-8 sequence
//! and a line. [`ChunkDecoder`] holds back an incomplete trailing UTF-8 sequence until the next
//! chunk; [`apply_text`] continues the buffer's open last line with the first segment of the
//! next chunk.

use crate::buffer::LineBuffer;
use chrono::{DateTime, Local};

/// Carries incomplete UTF-8 sequences across chunk boundaries
#[derive(Debug, Default, Clone)]
pub struct ChunkDecoder {
    carry: Vec<u8>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` as a continuation of the previous chunk.
    ///
    /// Invalid sequences become U+FFFD; an incomplete sequence at the very end is held back.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut data = std::mem::take(&mut self.carry);
        data.extend_from_slice(bytes);

        let hold = incomplete_suffix_len(&data);
        let carry = data.split_off(data.len() - hold);
        self.carry = carry;

        match String::from_utf8(data) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }

    /// Bytes currently held back
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Drop any held-back bytes
    pub fn reset(&mut self) {
        self.carry.clear();
    }
}

/// Length of a truncated multi-byte sequence at the end of `bytes`, or 0
fn incomplete_suffix_len(bytes: &[u8]) -> usize {
    let window = bytes.len().min(3);
    for back in 1..=window {
        let byte = bytes[bytes.len() - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let expected = match byte {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return 0,
        };
        return if back < expected { back } else { 0 };
    }
    0
}

/// Split decoded text into lines and append them to `buffer`.
///
/// The first segment continues the buffer's last line when that line is open. Segments followed
/// by `\n` are complete lines (a trailing `\r` is stripped); the final unterminated segment, if
/// any, becomes the new open line. Returns the number of lines pushed. Does not trim.
///
/// A chunk that is nothing but a line terminator never adds a line to a populated buffer; it
/// only closes the open last line, if there is one.
pub fn apply_text(buffer: &mut LineBuffer, text: &str, captured_at: DateTime<Local>) -> usize {
    if text.is_empty() {
        return 0;
    }
    if !buffer.is_empty() && matches!(text, "\n" | "\r\n") {
        buffer.close_last();
        return 0;
    }

    let mut pushed = 0;
    let mut segments = text.split('\n').peekable();
    let mut first = true;

    while let Some(segment) = segments.next() {
        let terminated = segments.peek().is_some();

        if first && buffer.tail_open() {
            buffer.extend_last(segment);
            if terminated {
                buffer.close_last();
            }
        } else if terminated {
            buffer.push(strip_cr(segment).to_string(), captured_at, false);
            pushed += 1;
        } else if !segment.is_empty() {
            buffer.push(segment.to_string(), captured_at, true);
            pushed += 1;
        }
        first = false;
    }

    pushed
}

fn strip_cr(segment: &str) -> &str {
    segment.strip_suffix('\r').unwrap_or(segment)
}
