//! Per-buffer lifecycle and throughput statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a buffer's counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Times storage was allocated
    pub allocations: u64,
    /// Times storage was freed
    pub frees: u64,
    /// Bytes handed to readers
    pub bytes_read: u64,
    /// Bytes accepted from writers
    pub bytes_written: u64,
    /// Times a caller parked on a condition variable
    pub waits: u64,
    /// Waits cut short by a raised signal
    pub interrupts: u64,
}

impl BufferStats {
    /// Bytes accepted but not yet consumed, as seen by the counters
    pub fn in_flight(&self) -> u64 {
        self.bytes_written.saturating_sub(self.bytes_read)
    }

    /// Get a summary string of the statistics
    pub fn summary(&self) -> String {
        format!(
            "BufferStats {{ allocations: {}, frees: {}, written: {}, read: {}, \
             waits: {}, interrupts: {} }}",
            self.allocations,
            self.frees,
            self.bytes_written,
            self.bytes_read,
            self.waits,
            self.interrupts
        )
    }
}

/// Thread-safe statistics updated by a synchronized buffer
#[derive(Debug, Default)]
pub struct AtomicBufferStats {
    allocations: AtomicU64,
    frees: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    waits: AtomicU64,
    interrupts: AtomicU64,
}

impl AtomicBufferStats {
    /// Create new statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage was allocated
    pub fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Storage was freed
    pub fn record_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    /// Bytes handed to a reader
    pub fn record_read(&self, bytes: usize) {
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Bytes accepted from a writer
    pub fn record_write(&self, bytes: usize) {
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// A caller parked on a condition variable
    pub fn record_wait(&self) {
        self.waits.fetch_add(1, Ordering::Relaxed);
    }

    /// A wait was cut short by a signal
    pub fn record_interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> BufferStats {
        BufferStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            interrupts: self.interrupts.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_snapshot() {
        let stats = AtomicBufferStats::new();
        stats.record_allocation();
        stats.record_write(10);
        stats.record_read(4);
        stats.record_wait();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.allocations, 1);
        assert_eq!(snapshot.frees, 0);
        assert_eq!(snapshot.in_flight(), 6);
        assert_eq!(snapshot.waits, 1);
        assert!(snapshot.summary().contains("written: 10"));
    }
}
