//! In-memory byte source.
//!
//! Cloning a [`MemorySource`] shares the underlying buffer, so one handle can be given to the
//! engine while another keeps appending, truncating or toggling availability.

use crate::error::{Result, WtailError};
use crate::source::{clamp_range, ByteSource, SourceKind};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryState {
    bytes: Vec<u8>,
    unavailable: Option<String>,
}

/// Shared growable buffer that behaves like a live file
#[derive(Debug, Clone)]
pub struct MemorySource {
    state: Arc<Mutex<MemoryState>>,
    name: String,
    kind: SourceKind,
}

impl MemorySource {
    /// Empty live source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            name: name.into(),
            kind: SourceKind::Live,
        }
    }

    /// Live source with initial content
    pub fn with_contents(name: impl Into<String>, contents: impl AsRef<[u8]>) -> Self {
        let source = Self::new(name);
        source.append(contents);
        source
    }

    /// Report this source as a snapshot instead of a live file
    pub fn as_snapshot(mut self) -> Self {
        self.kind = SourceKind::Snapshot;
        self
    }

    /// Append bytes, as a writer would
    pub fn append(&self, bytes: impl AsRef<[u8]>) {
        self.state.lock().bytes.extend_from_slice(bytes.as_ref());
    }

    /// Shrink to `len` bytes (truncation)
    pub fn truncate(&self, len: usize) {
        self.state.lock().bytes.truncate(len);
    }

    /// Replace the whole content (rotation to a new file)
    pub fn replace(&self, bytes: impl AsRef<[u8]>) {
        let mut state = self.state.lock();
        state.bytes.clear();
        state.bytes.extend_from_slice(bytes.as_ref());
    }

    /// Make every call fail with `SourceUnavailable` until cleared
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.state.lock().unavailable = reason.map(str::to_string);
    }

    /// Current length
    pub fn len(&self) -> usize {
        self.state.lock().bytes.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn size(&self) -> Result<u64> {
        let state = self.state.lock();
        match &state.unavailable {
            Some(reason) => Err(WtailError::unavailable_msg(reason.clone())),
            None => Ok(state.bytes.len() as u64),
        }
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        let state = self.state.lock();
        if let Some(reason) = &state.unavailable {
            return Err(WtailError::unavailable_msg(reason.clone()));
        }
        Ok(clamp_range(start, end, state.bytes.len() as u64)
            .map(|(start, end)| state.bytes[start..end].to_vec())
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }
}
