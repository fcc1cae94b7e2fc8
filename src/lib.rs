//! # wtail - Terminal Tail Viewer
//!
//! Follows a growing log file the way `tail -f` does, with a scrollable terminal view on top.
//!
//! ## Features
//!
//! - **Incremental tailing**: polls the file size and reads only the newly appended bytes
//! - **Rotation detection**: a shrinking file restarts reading from offset 0 with a marker line
//! - **Bounded memory**: retained lines are capped, oldest evicted first
//! - **Regex filtering**: non-destructive, re-applied to every retained line on change
//! - **Severity marks**: error/warning/success keywords are tagged per line
//! - **Compressed archives**: gzip, bzip2, xz and zstd files open as one-shot snapshots
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`config`] - Defaults, optional TOML config file and command-line overrides
//! - [`source`] - Byte sources: live file handles, snapshots and in-memory sources
//! - [`buffer`] - Bounded line buffer with partial-line tracking
//! - [`filter`] - Regex filter and severity classification
//! - [`engine`] - Tail engine (decode, tail load, rotation, throughput) and poll scheduler
//! - [`render`] - Render events, plain printer and the terminal UI
//! - [`input`] - Key bindings and the terminal input thread
//! - [`app`] - Application core and component coordination

// Core modules
pub mod config;
pub mod error;
pub mod source;

// Tailing pipeline
pub mod buffer;
pub mod engine;
pub mod filter;

// Front ends
pub mod input;
pub mod render;

pub mod app;

// Re-export commonly used types for convenience
pub use error::{Result, WtailError};

// Public API surface for external usage
pub use app::Application;
pub use buffer::{Line, LineBuffer};
pub use config::{ConfigOverrides, TailConfig, ThemeName};
pub use engine::{PollScheduler, SharedEngine, TailEngine, TickOutcome};
pub use filter::{LineFilter, Severity, SeverityClassifier};
pub use render::protocol::{RenderEvent, TailStatus};
pub use source::{ByteSource, MemorySource, OpenMode, SourceFactory};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
