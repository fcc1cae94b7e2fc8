//! Initial tail window.
//!
//! Reads backward from the end of the source in fixed-size chunks until enough newlines have
//! been seen to bound the last `n` lines, or the start of the source is reached. Very long
//! lines just mean more chunks.

use crate::engine::decode::ChunkDecoder;
use crate::error::Result;
use crate::source::ByteSource;

/// Backward read granularity
pub const TAIL_CHUNK_SIZE: u64 = 64 * 1024;

/// Result of a tail load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailWindow {
    /// Up to `n` lines in file order, without terminators
    pub lines: Vec<String>,
    /// The source did not end with a terminator; the last line is still being written
    pub last_open: bool,
    /// Size observed when the load started; polling resumes here
    pub size: u64,
}

/// Load the last `n` lines of `source`.
///
/// An incomplete UTF-8 sequence at the end of the source is left in `decoder` so the first poll
/// completes it.
pub async fn load_tail(
    source: &dyn ByteSource,
    n: usize,
    decoder: &mut ChunkDecoder,
) -> Result<TailWindow> {
    let size = source.size().await?;
    if n == 0 || size == 0 {
        return Ok(TailWindow {
            lines: Vec::new(),
            last_open: false,
            size,
        });
    }

    let mut pos = size;
    let mut acc: Vec<u8> = Vec::new();
    let mut newlines = 0usize;

    while pos > 0 && newlines <= n {
        let start = pos.saturating_sub(TAIL_CHUNK_SIZE);
        let mut chunk = source.read_range(start, pos).await?;
        newlines += memchr::memchr_iter(b'\n', &chunk).count();
        chunk.extend_from_slice(&acc);
        acc = chunk;
        pos = start;
    }

    log::debug!(
        "tail load read {} bytes from {} ({} newlines)",
        acc.len(),
        source.name(),
        newlines
    );

    let text = decoder.decode(&acc).replace("\r\n", "\n");
    let last_open = !text.is_empty() && !text.ends_with('\n');

    let mut segments: Vec<&str> = text.split('\n').collect();
    if !last_open {
        segments.pop();
    }
    let keep_from = segments.len().saturating_sub(n);

    Ok(TailWindow {
        lines: segments[keep_from..].iter().map(|s| s.to_string()).collect(),
        last_open,
        size,
    })
}
