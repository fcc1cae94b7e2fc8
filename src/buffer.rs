//! Bounded line buffer.
//!
//! [`LineBuffer`] holds the decoded lines of the current source in file order. It never grows
//! past its capacity after a batch: the engine pushes a whole chunk worth of lines and then
//! calls [`LineBuffer::trim`] once, which evicts from the front.
//!
//! The last line may be *open*, meaning the file has not yet written its terminator. Only an
//! open line can be extended; once it is closed it is immutable.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// Smallest allowed capacity
pub const MIN_MAX_LINES: usize = 200;
/// Largest allowed capacity
pub const MAX_MAX_LINES: usize = 200_000;
/// Capacity used when nothing else is configured
pub const DEFAULT_MAX_LINES: usize = 5_000;

/// Clamp a requested capacity into `[MIN_MAX_LINES, MAX_MAX_LINES]`
pub fn clamp_max_lines(requested: usize) -> usize {
    requested.clamp(MIN_MAX_LINES, MAX_MAX_LINES)
}

/// One decoded line of the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Sequence number, unique and increasing within one opened source
    pub seq: u64,
    /// Line content without its terminator
    pub text: String,
    /// When the line (or its first fragment) was read
    pub captured_at: DateTime<Local>,
}

/// Ordered, bounded sequence of lines
#[derive(Debug, Clone)]
pub struct LineBuffer {
    lines: VecDeque<Line>,
    max_lines: usize,
    next_seq: u64,
    tail_open: bool,
}

impl LineBuffer {
    /// Create an empty buffer; `max_lines` is clamped
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: clamp_max_lines(max_lines),
            next_seq: 0,
            tail_open: false,
        }
    }

    /// Append a new line and return its sequence number.
    ///
    /// The previous last line is closed; the new one is open when `open` is true.
    pub fn push(&mut self, text: String, captured_at: DateTime<Local>, open: bool) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.lines.push_back(Line {
            seq,
            text,
            captured_at,
        });
        self.tail_open = open;
        seq
    }

    /// Append text to the open last line.
    ///
    /// Returns `false` (and changes nothing) if there is no open line.
    pub fn extend_last(&mut self, fragment: &str) -> bool {
        if !self.tail_open {
            return false;
        }
        match self.lines.back_mut() {
            Some(line) => {
                line.text.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// Mark the last line as terminated, stripping one trailing `\r`
    pub fn close_last(&mut self) {
        if self.tail_open {
            if let Some(line) = self.lines.back_mut() {
                if line.text.ends_with('\r') {
                    line.text.pop();
                }
            }
        }
        self.tail_open = false;
    }

    /// Whether the last line is still waiting for its terminator
    pub fn tail_open(&self) -> bool {
        self.tail_open && !self.lines.is_empty()
    }

    /// Evict lines from the front until `len() <= max_lines`; returns the number evicted
    pub fn trim(&mut self) -> usize {
        let excess = self.lines.len().saturating_sub(self.max_lines);
        if excess > 0 {
            self.lines.drain(..excess);
        }
        excess
    }

    /// Change capacity (clamped) and trim; returns the number of lines evicted
    pub fn set_capacity(&mut self, max_lines: usize) -> usize {
        self.max_lines = clamp_max_lines(max_lines);
        self.trim()
    }

    /// Current capacity
    pub fn capacity(&self) -> usize {
        self.max_lines
    }

    /// Drop every line. Sequence numbers keep increasing.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.tail_open = false;
    }

    /// Drop every line and restart sequence numbers at zero
    pub fn reset(&mut self) {
        self.clear();
        self.next_seq = 0;
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Line> + ExactSizeIterator {
        self.lines.iter()
    }

    pub fn last(&self) -> Option<&Line> {
        self.lines.back()
    }

    /// Sequence number of the oldest retained line, or of the next line if empty
    pub fn first_seq(&self) -> u64 {
        self.lines.front().map_or(self.next_seq, |line| line.seq)
    }

    /// Lines whose sequence number is at least `seq`
    pub fn since(&self, seq: u64) -> impl Iterator<Item = &Line> {
        let skip = self.lines.partition_point(|line| line.seq < seq);
        self.lines.iter().skip(skip)
    }

    /// Sequence number the next pushed line will get
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}
