//! Engine types

use serde::Serialize;

/// Statistics from one sync run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Streams fully synced
    pub streams_synced: usize,
    /// Parent/child fetch cycles driven
    pub contexts_synced: usize,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create zeroed stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add emitted records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Count one completed stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Count one completed fetch cycle
    pub fn add_context(&mut self) {
        self.contexts_synced += 1;
    }

    /// Set the run duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
