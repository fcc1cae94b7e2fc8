//! The tail engine.
//!
//! [`TailEngine`] owns the offset into the current [`ByteSource`], the [`LineBuffer`], the
//! filter and the throughput meter. Each [`tick`](TailEngine::tick) polls the source once:
//!
//! 1. re-fetch the size; failure marks the source unavailable and skips the tick
//! 2. a size below the offset means rotation or truncation: restart from zero with a marker
//! 3. growth is read, decoded and appended, then the buffer is trimmed once
//!
//! Every visible change is announced as a [`RenderEvent`] on the channel given at construction.
//! The engine does not schedule itself; see [`scheduler::PollScheduler`].

pub mod decode;
pub mod rate;
pub mod scheduler;
pub mod tail_load;

use crate::buffer::{Line, LineBuffer};
use crate::config::TailConfig;
use crate::error::{Result, WtailError};
use crate::filter::{LineFilter, SeverityClassifier};
use crate::render::protocol::{RenderEvent, RenderedLine, SourceMeta, TailStats, TailStatus};
use crate::source::{ByteSource, SourceKind};
use chrono::Local;
use decode::{apply_text, ChunkDecoder};
use rate::ThroughputMeter;
use std::time::Instant;
use tail_load::load_tail;
use tokio::sync::mpsc::UnboundedSender;

pub use scheduler::{PollScheduler, SharedEngine};

/// Synthetic line appended when the source shrinks below the offset
pub const ROTATION_MARKER: &str = "[log rotated or truncated → restarting from 0]";

/// Why a tick did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Paused,
    NoSource,
    Unavailable,
}

/// What a tick that did work observed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    pub bytes_read: u64,
    /// New lines pushed, including a rotation marker
    pub lines_added: usize,
    pub evicted: usize,
    pub rotated: bool,
    pub rate: Option<f64>,
}

/// Result of one poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    /// Size unchanged
    Unchanged,
    Progress(TickReport),
}

/// Polls one source and keeps the bounded line buffer in sync with it
pub struct TailEngine {
    source: Option<Box<dyn ByteSource>>,
    offset: u64,
    last_size: u64,
    paused: bool,
    filter: Option<LineFilter>,
    follow: bool,
    wrap: bool,
    buffer: LineBuffer,
    decoder: ChunkDecoder,
    meter: ThroughputMeter,
    status: TailStatus,
    classifier: SeverityClassifier,
    events: UnboundedSender<RenderEvent>,
}

impl TailEngine {
    /// Create an idle engine; capacity, filter, wrap and follow come from `config`
    pub fn new(config: &TailConfig, events: UnboundedSender<RenderEvent>) -> Self {
        Self {
            source: None,
            offset: 0,
            last_size: 0,
            paused: false,
            filter: LineFilter::parse(config.filter.trim()),
            follow: config.follow,
            wrap: config.wrap,
            buffer: LineBuffer::new(config.max_lines),
            decoder: ChunkDecoder::new(),
            meter: ThroughputMeter::new(),
            status: TailStatus::Idle,
            classifier: SeverityClassifier::new(),
            events,
        }
    }

    /// Replace the current source and load its last `initial_lines` lines.
    ///
    /// On failure the engine is left idle with no source.
    pub async fn open(&mut self, source: Box<dyn ByteSource>, initial_lines: usize) -> Result<()> {
        self.reset();
        self.set_status(TailStatus::Opening);
        log::info!("opening {} ({})", source.name(), source.kind().label());

        let window = match load_tail(source.as_ref(), initial_lines, &mut self.decoder).await {
            Ok(window) => window,
            Err(err) => {
                log::warn!("failed to load {}: {}", source.name(), err);
                self.decoder.reset();
                self.set_status(TailStatus::Idle);
                return Err(err);
            }
        };

        let now = Local::now();
        let count = window.lines.len();
        for (i, text) in window.lines.into_iter().enumerate() {
            let open = window.last_open && i + 1 == count;
            self.buffer.push(text, now, open);
        }
        self.buffer.trim();

        self.offset = window.size;
        self.last_size = window.size;
        self.meter.start(Instant::now());
        let kind = source.kind();
        self.source = Some(source);

        self.emit_meta();
        self.render_full();
        self.emit_stats();
        self.set_status(match kind {
            SourceKind::Live => TailStatus::Ready,
            SourceKind::Snapshot => TailStatus::Loaded,
        });
        Ok(())
    }

    /// Drop the source and every line; filter, wrap, follow and capacity are kept
    pub fn reset(&mut self) {
        self.source = None;
        self.offset = 0;
        self.last_size = 0;
        self.paused = false;
        self.buffer.reset();
        self.decoder.reset();
        self.meter.reset();
        self.set_status(TailStatus::Idle);
        self.render_full();
        self.emit_stats();
    }

    /// Poll the source once
    pub async fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now()).await
    }

    /// Poll the source once, using `now` for the throughput measurement
    pub async fn tick_at(&mut self, now: Instant) -> TickOutcome {
        if self.paused {
            return TickOutcome::Skipped(SkipReason::Paused);
        }

        let size = match self.source.as_deref() {
            Some(source) => source.size().await,
            None => return TickOutcome::Skipped(SkipReason::NoSource),
        };
        let size = match size {
            Ok(size) => size,
            Err(err) => {
                self.mark_unavailable(&err);
                return TickOutcome::Skipped(SkipReason::Unavailable);
            }
        };

        let tail_before = self.open_tail();
        let first_new_seq = self.buffer.next_seq();
        let mut report = TickReport::default();

        if size < self.offset {
            log::info!(
                "source shrank from {} to {} bytes; restarting from 0",
                self.offset,
                size
            );
            self.offset = 0;
            self.decoder.reset();
            self.buffer.close_last();
            self.buffer
                .push(ROTATION_MARKER.to_string(), Local::now(), false);
            report.rotated = true;
            report.lines_added += 1;
        }

        if size > self.offset {
            let start = self.offset;
            let read = match self.source.as_deref() {
                Some(source) => source.read_range(start, size).await,
                None => return TickOutcome::Skipped(SkipReason::NoSource),
            };
            match read {
                Ok(bytes) => {
                    self.offset = start + bytes.len() as u64;
                    report.bytes_read = bytes.len() as u64;
                    if !bytes.is_empty() {
                        report.rate = self.meter.record(report.bytes_read, now);
                    }
                    let text = self.decoder.decode(&bytes);
                    report.lines_added += apply_text(&mut self.buffer, &text, Local::now());
                }
                Err(err) => {
                    self.mark_unavailable(&err);
                    if report.rotated {
                        self.buffer.trim();
                        self.emit_append(tail_before, first_new_seq);
                        self.emit_stats();
                    }
                    return TickOutcome::Skipped(SkipReason::Unavailable);
                }
            }
        }

        self.last_size = size;
        if self.status.is_unavailable() {
            log::info!("source available again");
        }
        if matches!(self.status, TailStatus::Unavailable(_) | TailStatus::Ready) {
            self.set_status(TailStatus::Tailing);
        }

        self.emit_meta();
        if !report.rotated && report.bytes_read == 0 {
            return TickOutcome::Unchanged;
        }

        report.evicted = self.buffer.trim();
        self.emit_append(tail_before, first_new_seq);
        self.emit_stats();
        log::trace!("tick: {report:?}");
        TickOutcome::Progress(report)
    }

    /// Stop doing work on ticks
    pub fn pause(&mut self) {
        self.paused = true;
        self.set_status(TailStatus::Paused);
    }

    /// Resume after [`pause`](Self::pause)
    pub fn resume(&mut self) {
        self.paused = false;
        let status = match self.source.as_deref().map(|s| s.kind()) {
            Some(SourceKind::Live) => TailStatus::Tailing,
            Some(SourceKind::Snapshot) => TailStatus::Loaded,
            None => TailStatus::Idle,
        };
        self.set_status(status);
    }

    /// Set the filter; empty or invalid patterns disable filtering. Re-renders everything.
    pub fn set_filter(&mut self, pattern: &str) {
        self.filter = LineFilter::parse(pattern.trim());
        self.render_full();
    }

    /// Change capacity (clamped), trimming immediately; returns the effective capacity
    pub fn set_max_lines(&mut self, max_lines: usize) -> usize {
        let evicted = self.buffer.set_capacity(max_lines);
        if evicted > 0 {
            log::debug!("capacity change evicted {evicted} lines");
        }
        self.render_full();
        self.emit_stats();
        self.buffer.capacity()
    }

    pub fn set_follow(&mut self, follow: bool) {
        self.follow = follow;
    }

    pub fn set_wrap(&mut self, wrap: bool) {
        self.wrap = wrap;
        self.render_full();
    }

    /// Drop every retained line; tailing continues from the current offset
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.render_full();
        self.emit_stats();
    }

    /// Emit a full render of the retained lines against the current filter
    pub fn render_full(&self) {
        let lines = self
            .buffer
            .iter()
            .filter(|line| self.passes_filter(&line.text))
            .map(|line| self.render_line(line))
            .collect();
        self.emit_render(RenderEvent::Full {
            lines,
            wrap: self.wrap,
            filter: self.filter_pattern().map(str::to_string),
        });
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn lines(&self) -> &LineBuffer {
        &self.buffer
    }

    pub fn status(&self) -> &TailStatus {
        &self.status
    }

    /// Last measured throughput in bytes per second
    pub fn rate(&self) -> Option<f64> {
        self.meter.rate()
    }

    pub fn filter_pattern(&self) -> Option<&str> {
        self.filter.as_ref().map(LineFilter::pattern)
    }

    pub fn max_lines(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn follow(&self) -> bool {
        self.follow
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    /// Whether the current source can grow (and so needs polling)
    pub fn is_live(&self) -> bool {
        matches!(
            self.source.as_deref().map(|s| s.kind()),
            Some(SourceKind::Live)
        )
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_deref().map(|s| s.name())
    }

    fn open_tail(&self) -> Option<(u64, String)> {
        if self.buffer.tail_open() {
            self.buffer.last().map(|line| (line.seq, line.text.clone()))
        } else {
            None
        }
    }

    fn passes_filter(&self, text: &str) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(text))
    }

    fn is_open_line(&self, line: &Line) -> bool {
        self.buffer.tail_open() && self.buffer.last().map(|l| l.seq) == Some(line.seq)
    }

    fn render_line(&self, line: &Line) -> RenderedLine {
        RenderedLine {
            seq: line.seq,
            captured_at: line.captured_at,
            text: line.text.clone(),
            spans: self
                .filter
                .as_ref()
                .map(|f| f.match_spans(&line.text))
                .unwrap_or_default(),
            severity: self.classifier.classify(&line.text),
            open: self.is_open_line(line),
        }
    }

    fn emit_append(&self, tail_before: Option<(u64, String)>, first_new_seq: u64) {
        let mut revised_tail = None;
        if let Some((seq, old_text)) = tail_before {
            let current = self.buffer.since(seq).next().filter(|line| line.seq == seq);
            if let Some(line) = current {
                let changed = line.text != old_text || !self.is_open_line(line);
                let visible_before = self.passes_filter(&old_text);
                let visible_now = self.passes_filter(&line.text);
                if changed && visible_before && !visible_now {
                    // A view cannot drop a single line from an append; redraw instead
                    self.render_full();
                    return;
                }
                if changed && visible_now {
                    revised_tail = Some(self.render_line(line));
                }
            }
        }

        let lines = self
            .buffer
            .since(first_new_seq)
            .filter(|line| self.passes_filter(&line.text))
            .map(|line| self.render_line(line))
            .collect();

        self.emit_render(RenderEvent::Append {
            first_retained_seq: self.buffer.first_seq(),
            revised_tail,
            lines,
            wrap: self.wrap,
            filter: self.filter_pattern().map(str::to_string),
        });
    }

    fn emit_render(&self, event: RenderEvent) {
        self.emit(event);
        if self.follow {
            self.emit(RenderEvent::ScrollToEnd);
        }
    }

    fn emit_meta(&self) {
        if let Some(source) = self.source.as_deref() {
            self.emit(RenderEvent::Meta(SourceMeta {
                name: source.name().to_string(),
                kind: source.kind(),
                size: self.last_size,
                position: self.offset,
            }));
        }
    }

    fn emit_stats(&self) {
        self.emit(RenderEvent::Stats(TailStats {
            rate: self.meter.rate(),
            lines: self.buffer.len(),
            max_lines: self.buffer.capacity(),
        }));
    }

    fn emit(&self, event: RenderEvent) {
        // Receiver gone means the session is shutting down
        let _ = self.events.send(event);
    }

    fn set_status(&mut self, status: TailStatus) {
        if self.status != status {
            self.status = status.clone();
            self.emit(RenderEvent::Status(status));
        }
    }

    fn mark_unavailable(&mut self, err: &WtailError) {
        if !self.status.is_unavailable() {
            log::warn!("source unavailable: {err}");
        }
        self.set_status(TailStatus::Unavailable(err.to_string()));
    }
}
