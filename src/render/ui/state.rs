//! View model for the terminal UI.
//!
//! [`LogView`] applies [`RenderEvent`]s to a local copy of the visible lines and owns the
//! scroll position. It knows nothing about the engine; everything it shows arrived as an event.

use crate::render::format::{format_bytes, format_rate};
use crate::render::protocol::{RenderEvent, RenderedLine, SourceMeta, TailStats, TailStatus};
use std::collections::VecDeque;
use std::ops::Range;
use std::time::{Duration, Instant};

/// Columns taken by the severity mark, timestamp and line number
pub const GUTTER_WIDTH: usize = 18;

/// How long appended lines stay highlighted
pub const FRESH_FOR: Duration = Duration::from_secs(2);

/// A line as held by the view
#[derive(Debug, Clone)]
pub struct ViewLine {
    pub line: RenderedLine,
    /// Set for lines delivered by an append, not by a full render
    pub arrived: Option<Instant>,
}

impl ViewLine {
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.arrived
            .map_or(false, |at| now.saturating_duration_since(at) < FRESH_FOR)
    }
}

/// Everything the terminal UI draws
#[derive(Debug)]
pub struct LogView {
    lines: VecDeque<ViewLine>,
    top: usize,
    pinned: bool,
    pub wrap: bool,
    pub filter: Option<String>,
    pub follow: bool,
    pub status: TailStatus,
    pub meta: Option<SourceMeta>,
    pub stats: TailStats,
    /// Filter being edited, shown in place of the status line
    pub prompt: Option<String>,
    pub message: Option<String>,
    pub viewport_width: u16,
    pub viewport_height: u16,
}

impl LogView {
    pub fn new(viewport_width: u16, viewport_height: u16) -> Self {
        Self {
            lines: VecDeque::new(),
            top: 0,
            pinned: true,
            wrap: false,
            filter: None,
            follow: true,
            status: TailStatus::Idle,
            meta: None,
            stats: TailStats::default(),
            prompt: None,
            message: None,
            viewport_width,
            viewport_height,
        }
    }

    /// Apply one engine event
    pub fn apply(&mut self, event: RenderEvent) {
        match event {
            RenderEvent::Full {
                lines,
                wrap,
                filter,
            } => {
                self.lines = lines
                    .into_iter()
                    .map(|line| ViewLine {
                        line,
                        arrived: None,
                    })
                    .collect();
                self.wrap = wrap;
                self.filter = filter;
                self.top = self.top.min(self.max_top());
            }
            RenderEvent::Append {
                first_retained_seq,
                revised_tail,
                lines,
                wrap,
                filter,
            } => {
                self.drop_evicted(first_retained_seq);
                if let Some(revised) = revised_tail {
                    self.revise_tail(revised);
                }
                let now = Instant::now();
                self.lines.extend(lines.into_iter().map(|line| ViewLine {
                    line,
                    arrived: Some(now),
                }));
                self.wrap = wrap;
                self.filter = filter;
            }
            RenderEvent::ScrollToEnd => self.go_to_end(),
            RenderEvent::Status(status) => self.status = status,
            RenderEvent::Meta(meta) => self.meta = Some(meta),
            RenderEvent::Stats(stats) => self.stats = stats,
        }
    }

    fn drop_evicted(&mut self, first_retained_seq: u64) {
        let evicted = self
            .lines
            .iter()
            .take_while(|v| v.line.seq < first_retained_seq)
            .count();
        if evicted > 0 {
            self.lines.drain(..evicted);
            self.top = self.top.saturating_sub(evicted);
        }
    }

    fn revise_tail(&mut self, revised: RenderedLine) {
        match self.lines.back().map(|v| v.line.seq) {
            Some(seq) if seq == revised.seq => {
                if let Some(last) = self.lines.back_mut() {
                    last.line = revised;
                }
            }
            Some(seq) if seq > revised.seq => {}
            _ => self.lines.push_back(ViewLine {
                line: revised,
                arrived: Some(Instant::now()),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &ViewLine> {
        self.lines.iter()
    }

    /// Rows available for log lines (header and status line excluded)
    pub fn content_height(&self) -> usize {
        usize::from(self.viewport_height.saturating_sub(2))
    }

    fn max_top(&self) -> usize {
        self.lines.len().saturating_sub(self.content_height().max(1))
    }

    /// Rows a line occupies at the current width
    fn row_height(&self, line: &ViewLine) -> usize {
        if !self.wrap {
            return 1;
        }
        let width = usize::from(self.viewport_width).saturating_sub(GUTTER_WIDTH).max(1);
        line.line.text.chars().count().max(1).div_ceil(width)
    }

    /// Index range of lines to draw
    pub fn window(&self) -> Range<usize> {
        let rows = self.content_height().max(1);
        let len = self.lines.len();

        if self.pinned {
            let mut start = len;
            let mut used = 0;
            while start > 0 {
                let height = self.row_height(&self.lines[start - 1]);
                if used + height > rows && start < len {
                    break;
                }
                used += height;
                start -= 1;
            }
            return start..len;
        }

        let start = self.top.min(len);
        let mut end = start;
        let mut used = 0;
        while end < len {
            let height = self.row_height(&self.lines[end]);
            if used + height > rows && end > start {
                break;
            }
            used += height;
            end += 1;
        }
        start..end
    }

    pub fn visible(&self) -> impl Iterator<Item = &ViewLine> {
        let range = self.window();
        self.lines.range(range)
    }

    /// Whether the view is showing the newest line
    pub fn at_end(&self) -> bool {
        self.pinned
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let start = self.window().start;
        self.pinned = false;
        self.top = start.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        if self.pinned {
            return;
        }
        self.top = (self.top + lines).min(self.max_top());
        if self.top >= self.max_top() {
            self.pinned = true;
        }
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.content_height().max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.content_height().max(1));
    }

    pub fn go_to_start(&mut self) {
        self.pinned = self.lines.len() <= self.content_height();
        self.top = 0;
    }

    pub fn go_to_end(&mut self) {
        self.pinned = true;
        self.top = self.max_top();
    }

    /// Returns true if the size changed
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        let changed = self.viewport_width != width || self.viewport_height != height;
        if changed {
            self.viewport_width = width;
            self.viewport_height = height;
            self.top = self.top.min(self.max_top());
        }
        changed
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// `"app.log · 1.0 KB · pos 1.0 KB · live tail  [Tailing…]"`
    pub fn header_text(&self) -> String {
        let source = self
            .meta
            .as_ref()
            .map_or_else(|| "no file".to_string(), SourceMeta::summary);
        format!("{source}  [{}]", self.status.label())
    }

    /// Rate, line count and mode flags, or the filter prompt while editing
    pub fn status_text(&self) -> String {
        if let Some(prompt) = &self.prompt {
            return format!("/{prompt}");
        }

        let mut parts = vec![
            format_rate(self.stats.rate),
            format!("{} lines (max {})", self.stats.lines, self.stats.max_lines),
        ];
        if let Some(filter) = &self.filter {
            parts.push(format!("filter: {filter} ({} shown)", self.lines.len()));
        }
        let mut flags = Vec::new();
        if self.follow {
            flags.push("follow");
        }
        if self.wrap {
            flags.push("wrap");
        }
        if !flags.is_empty() {
            parts.push(flags.join(" "));
        }
        if let Some(meta) = &self.meta {
            if meta.size > 0 {
                parts.push(format!(
                    "{} read",
                    format_bytes(meta.position as f64)
                ));
            }
        }
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        parts.join(" | ")
    }
}
