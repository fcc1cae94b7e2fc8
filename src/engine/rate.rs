//! Throughput measurement.

use std::time::Instant;

/// Bytes-per-second over the interval between two data-bearing reads
#[derive(Debug, Clone, Default)]
pub struct ThroughputMeter {
    last_read_at: Option<Instant>,
    rate: Option<f64>,
}

impl ThroughputMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the baseline (called when a source is opened)
    pub fn start(&mut self, now: Instant) {
        self.last_read_at = Some(now);
        self.rate = None;
    }

    /// Record a read of `bytes` at `now`; returns the updated rate.
    ///
    /// Without a baseline the first call only sets one.
    pub fn record(&mut self, bytes: u64, now: Instant) -> Option<f64> {
        if let Some(previous) = self.last_read_at {
            let elapsed = now.saturating_duration_since(previous).as_secs_f64();
            if elapsed > 0.0 {
                self.rate = Some(bytes as f64 / elapsed);
            }
        }
        self.last_read_at = Some(now);
        self.rate
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
