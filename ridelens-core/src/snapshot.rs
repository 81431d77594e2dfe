//! Pending metric values awaiting transmission
//!
//! The snapshot holds the latest formatted value per metric. Every update
//! marks it dirty; a flush reads it and records the flush time. It is owned
//! by the coordinator and only touched from the coordinator's context.

use crate::metrics::{Metric, MetricValue};

/// Latest formatted value per metric plus flush bookkeeping
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    values: [Option<MetricValue>; Metric::COUNT],
    dirty: bool,
    last_flush_ms: Option<u64>,
}

impl Snapshot {
    /// Create an empty, clean snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw sample, formatting it for display
    pub fn update(&mut self, metric: Metric, raw: f32) {
        self.values[metric.index()] = Some(metric.format(raw));
        self.dirty = true;
    }

    /// Record an already formatted value
    pub fn set(&mut self, metric: Metric, value: MetricValue) {
        self.values[metric.index()] = Some(value);
        self.dirty = true;
    }

    /// Latest formatted value for a metric
    pub fn value(&self, metric: Metric) -> Option<&str> {
        self.values[metric.index()].as_ref().map(|v| v.as_str())
    }

    /// Force the next flush to re-render
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check for pending changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Time of the previous flush
    pub fn last_flush_ms(&self) -> Option<u64> {
        self.last_flush_ms
    }

    /// Check whether a flush should happen now
    ///
    /// True only when there are pending changes and at least
    /// `min_interval_ms` has passed since the previous flush.
    pub fn is_flush_due(&self, now_ms: u64, min_interval_ms: u64) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_flush_ms {
            Some(last) => now_ms.saturating_sub(last) >= min_interval_ms,
            None => true,
        }
    }

    /// Clear the dirty flag and record the flush time
    pub fn mark_flushed(&mut self, now_ms: u64) {
        self.dirty = false;
        self.last_flush_ms = Some(now_ms);
    }

    /// Drop all values
    pub fn clear(&mut self) {
        for value in &mut self.values {
            *value = None;
        }
        self.dirty = true;
    }
}
