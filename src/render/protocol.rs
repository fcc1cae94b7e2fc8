//! Protocol definitions shared between the tail engine and its views.
//!
//! The engine never draws anything. It emits [`RenderEvent`]s over an unbounded channel and the
//! terminal view or the plain printer applies them.

use crate::filter::Severity;
use crate::render::format::format_bytes;
use crate::source::SourceKind;
use chrono::{DateTime, Local};

/// A line prepared for display
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    pub seq: u64,
    pub captured_at: DateTime<Local>,
    pub text: String,
    /// Byte ranges of filter matches inside `text`
    pub spans: Vec<(usize, usize)>,
    pub severity: Severity,
    /// Still waiting for its terminator; the text may grow
    pub open: bool,
}

/// Engine lifecycle status shown in the header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TailStatus {
    #[default]
    Idle,
    Opening,
    Ready,
    Tailing,
    Paused,
    /// Snapshot fully loaded; nothing more will arrive
    Loaded,
    /// Size or read failed; polling keeps retrying
    Unavailable(String),
}

impl TailStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TailStatus::Idle => "Idle",
            TailStatus::Opening => "Opening…",
            TailStatus::Ready => "Ready",
            TailStatus::Tailing => "Tailing…",
            TailStatus::Paused => "Paused",
            TailStatus::Loaded => "Loaded",
            TailStatus::Unavailable(_) => "Permission denied or file unavailable",
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, TailStatus::Unavailable(_))
    }
}

/// Facts about the open source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMeta {
    pub name: String,
    pub kind: SourceKind,
    /// Last observed size
    pub size: u64,
    /// Bytes consumed so far
    pub position: u64,
}

impl SourceMeta {
    /// `"app.log · 1.2 MB · pos 1.2 MB · live tail"`
    pub fn summary(&self) -> String {
        format!(
            "{} · {} · pos {} · {}",
            self.name,
            format_bytes(self.size as f64),
            format_bytes(self.position as f64),
            self.kind.label()
        )
    }
}

/// Throughput and buffer statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TailStats {
    /// Bytes per second over the last data-bearing tick
    pub rate: Option<f64>,
    /// Lines currently retained
    pub lines: usize,
    pub max_lines: usize,
}

/// Instructions from the engine to a view
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// Replace everything with `lines`
    Full {
        lines: Vec<RenderedLine>,
        wrap: bool,
        filter: Option<String>,
    },
    /// Incremental update after a tick
    Append {
        /// Lines with a lower sequence number were evicted
        first_retained_seq: u64,
        /// New text or terminator state of the line that was open before this tick
        revised_tail: Option<RenderedLine>,
        /// Newly added lines that pass the filter
        lines: Vec<RenderedLine>,
        wrap: bool,
        filter: Option<String>,
    },
    ScrollToEnd,
    Status(TailStatus),
    Meta(SourceMeta),
    Stats(TailStats),
}
