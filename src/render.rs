//! Rendering subsystem.
//!
//! The engine speaks [`protocol::RenderEvent`]s; [`ui`] turns them into a ratatui screen and
//! [`plain`] into plain lines on a writer.

pub mod format;
pub mod plain;
pub mod protocol;
pub mod ui;

pub use plain::PlainPrinter;
pub use protocol::{RenderEvent, RenderedLine, SourceMeta, TailStats, TailStatus};
