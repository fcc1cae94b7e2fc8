//! Plain line printer.
//!
//! Consumes the same [`RenderEvent`] stream as the terminal UI but writes completed lines to
//! any [`Write`], like `tail -f`. Open lines are held back until their terminator arrives.
//! Full renders never reprint lines that were already written. Opening a new source starts
//! sequence numbers over, so the printer forgets what it printed when it sees `Opening`.

use crate::render::protocol::{RenderEvent, RenderedLine, TailStatus};
use std::io::{self, Write};

/// Writes each completed line once
pub struct PlainPrinter<W: Write> {
    out: W,
    last_printed: Option<u64>,
    pending_open: Option<RenderedLine>,
}

impl<W: Write> PlainPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_printed: None,
            pending_open: None,
        }
    }

    /// Apply one event; returns the number of lines written
    pub fn apply(&mut self, event: &RenderEvent) -> io::Result<usize> {
        let written = match event {
            RenderEvent::Full { lines, .. } => self.print_all(lines.iter())?,
            RenderEvent::Append {
                revised_tail,
                lines,
                ..
            } => self.print_all(revised_tail.iter().chain(lines.iter()))?,
            RenderEvent::Status(TailStatus::Opening) => {
                self.last_printed = None;
                self.pending_open = None;
                0
            }
            RenderEvent::Status(TailStatus::Unavailable(reason)) => {
                log::debug!("plain output paused: {reason}");
                0
            }
            _ => 0,
        };
        if written > 0 {
            self.out.flush()?;
        }
        Ok(written)
    }

    /// Write the held-back open line, if any (end of a one-shot load)
    pub fn finish(&mut self) -> io::Result<usize> {
        let Some(line) = self.pending_open.take() else {
            return Ok(0);
        };
        if self.is_new(line.seq) {
            writeln!(self.out, "{}", line.text)?;
            self.last_printed = Some(line.seq);
            self.out.flush()?;
            return Ok(1);
        }
        Ok(0)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_all<'a>(&mut self, lines: impl Iterator<Item = &'a RenderedLine>) -> io::Result<usize> {
        let mut written = 0;
        for line in lines {
            if !self.is_new(line.seq) {
                continue;
            }
            if line.open {
                self.pending_open = Some(line.clone());
                continue;
            }
            writeln!(self.out, "{}", line.text)?;
            self.last_printed = Some(line.seq);
            written += 1;
        }
        Ok(written)
    }

    fn is_new(&self, seq: u64) -> bool {
        self.last_printed.map_or(true, |last| seq > last)
    }
}
