//! Lock-guarded ring with blocking reads, blocking writes and a single
//! writer slot
//!
//! Storage is allocated when the first reader or writer is admitted and freed
//! when the last one leaves, so a buffer nobody holds never carries stale
//! bytes into its next use.
//!
//! Two condition variables hang off the lock:
//!
//! - `data_ready`: the ring went from empty to non-empty
//! - `room_or_slot_ready`: space was freed *or* the writer slot was released
//!
//! The second one serves two predicates on purpose. Every wait re-tests its
//! own predicate under the lock after waking, so a wakeup meant for the other
//! predicate only costs a spurious loop iteration.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use crate::{
    error::{PipeError, Result},
    ringbuf::CircularBuffer,
    transfer::{TransferSink, TransferSource},
};

use super::{
    signal::Signal,
    stats::{AtomicBufferStats, BufferStats},
};

/// State guarded by the buffer lock
#[derive(Debug)]
struct BufferState {
    /// `None` while nobody holds the buffer
    ring: Option<CircularBuffer>,
    reader_count: usize,
    writer_count: usize,
}

impl BufferState {
    fn holders(&self) -> usize {
        self.reader_count + self.writer_count
    }
}

/// Point-in-time view of a synchronized buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSnapshot {
    /// Whether storage is currently allocated
    pub allocated: bool,
    /// Configured ring capacity, including the reserved slot
    pub capacity: usize,
    /// Unread bytes (0 when unallocated)
    pub used: usize,
    /// Writable bytes (0 when unallocated)
    pub free: usize,
    /// Admitted readers
    pub readers: usize,
    /// Admitted writers (0 or 1)
    pub writers: usize,
}

/// One direction of a duplex channel
#[derive(Debug)]
pub struct SynchronizedBuffer {
    /// Label used in log output
    name: String,
    /// Capacity used for every lazy allocation
    capacity: usize,
    state: Mutex<BufferState>,
    data_ready: Condvar,
    room_or_slot_ready: Condvar,
    stats: AtomicBufferStats,
}

impl SynchronizedBuffer {
    /// Create an unallocated buffer that will hold `capacity` bytes of storage
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            state: Mutex::new(BufferState {
                ring: None,
                reader_count: 0,
                writer_count: 0,
            }),
            data_ready: Condvar::new(),
            room_or_slot_ready: Condvar::new(),
            stats: AtomicBufferStats::new(),
        }
    }

    /// Name given at construction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage size in bytes, including the reserved slot
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Critical sections never leave the state half-updated, so a panic in
    // another holder does not make the state unusable.
    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_allocated(&self, state: &mut BufferState) -> Result<()> {
        if state.ring.is_none() {
            state.ring = Some(CircularBuffer::allocate(self.capacity)?);
            self.stats.record_allocation();
            debug!("{}: allocated {} byte ring", self.name, self.capacity);
        }
        Ok(())
    }

    fn free_if_unused(&self, state: &mut BufferState) {
        if state.holders() == 0 && state.ring.take().is_some() {
            self.stats.record_free();
            debug!("{}: last holder left, ring freed", self.name);
        }
    }

    /// Guarded wait: park on `condvar` unless the signal is already pending
    ///
    /// The caller re-tests its predicate on the returned guard.
    fn park<'a>(
        self: &'a Arc<Self>,
        guard: MutexGuard<'a, BufferState>,
        condvar: &Condvar,
        signal: Option<&Signal>,
        operation: &'static str,
    ) -> Result<MutexGuard<'a, BufferState>> {
        if let Some(signal) = signal {
            signal.park_on(self);
            if signal.take_pending() {
                self.stats.record_interrupt();
                trace!("{}: {} interrupted", self.name, operation);
                return Err(PipeError::interrupted(operation));
            }
        }

        self.stats.record_wait();
        trace!("{}: {} waiting", self.name, operation);
        Ok(condvar.wait(guard).unwrap_or_else(PoisonError::into_inner))
    }

    fn not_admitted(&self, operation: &str) -> PipeError {
        PipeError::invalid_argument(
            "buffer",
            format!("{} on '{}' without an admitted holder", operation, self.name),
        )
    }

    /// Admit a reader, allocating storage if this is the first holder
    pub fn acquire_as_reader(&self) -> Result<()> {
        let mut state = self.lock();
        self.ensure_allocated(&mut state)?;
        state.reader_count += 1;
        trace!("{}: reader admitted ({} total)", self.name, state.reader_count);
        Ok(())
    }

    /// Take the single writer slot
    ///
    /// While another writer holds the slot this waits (or returns
    /// [`PipeError::WouldBlock`] when `non_blocking`).
    pub fn acquire_as_writer(
        self: &Arc<Self>,
        non_blocking: bool,
        signal: Option<&Signal>,
    ) -> Result<()> {
        let mut state = self.lock();
        while state.writer_count > 0 {
            if non_blocking {
                return Err(PipeError::would_block("open for writing"));
            }
            state = self.park(state, &self.room_or_slot_ready, signal, "open for writing")?;
        }

        self.ensure_allocated(&mut state)?;
        state.writer_count = 1;
        trace!("{}: writer admitted", self.name);
        Ok(())
    }

    /// Drop one reader, freeing storage when nobody is left
    pub fn release_as_reader(&self) {
        let mut state = self.lock();
        debug_assert!(state.reader_count > 0, "reader released twice");
        state.reader_count = state.reader_count.saturating_sub(1);
        self.free_if_unused(&mut state);
    }

    /// Give up the writer slot, freeing storage when nobody is left
    pub fn release_as_writer(&self) {
        let mut state = self.lock();
        debug_assert!(state.writer_count == 1, "writer released twice");
        state.writer_count = 0;
        self.free_if_unused(&mut state);
        drop(state);

        self.room_or_slot_ready.notify_all();
    }

    /// Move up to `sink.capacity()` buffered bytes into `sink`
    ///
    /// At most one contiguous run is transferred, so a read that meets the end
    /// of storage returns short and the rest comes with the next call.
    pub fn read<S: TransferSink + ?Sized>(
        self: &Arc<Self>,
        sink: &mut S,
        non_blocking: bool,
        signal: Option<&Signal>,
    ) -> Result<usize> {
        let max_len = sink.capacity();
        if max_len == 0 {
            return Ok(0);
        }

        let mut state = self.lock();
        loop {
            let ring = state.ring.as_ref().ok_or_else(|| self.not_admitted("read"))?;
            if !ring.is_empty() {
                break;
            }
            if non_blocking {
                return Err(PipeError::would_block("read"));
            }
            state = self.park(state, &self.data_ready, signal, "read")?;
        }

        let ring = state.ring.as_mut().ok_or_else(|| self.not_admitted("read"))?;
        let run = ring.readable_run();
        let count = run.len().min(max_len);
        sink.copy_out(&run[..count])?;
        ring.advance_read(count);
        drop(state);

        self.stats.record_read(count);
        self.room_or_slot_ready.notify_all();
        Ok(count)
    }

    /// Move up to `source.remaining()` bytes from `source` into the ring
    ///
    /// Returns the number of bytes accepted, which may be less than offered
    /// when the ring is nearly full or the free run wraps.
    pub fn write<S: TransferSource + ?Sized>(
        self: &Arc<Self>,
        source: &mut S,
        non_blocking: bool,
        signal: Option<&Signal>,
    ) -> Result<usize> {
        let len = source.remaining();
        if len == 0 {
            return Ok(0);
        }

        let mut state = self.lock();
        loop {
            let ring = state.ring.as_ref().ok_or_else(|| self.not_admitted("write"))?;
            if !ring.is_full() {
                break;
            }
            if non_blocking {
                return Err(PipeError::would_block("write"));
            }
            state = self.park(state, &self.room_or_slot_ready, signal, "write")?;
        }

        let ring = state.ring.as_mut().ok_or_else(|| self.not_admitted("write"))?;
        let count = len
            .min(ring.free_space())
            .min(ring.contiguous_writable_run());
        source.copy_in(&mut ring.writable_run()[..count])?;
        ring.advance_write(count);
        drop(state);

        self.stats.record_write(count);
        self.data_ready.notify_all();
        Ok(count)
    }

    /// Wake every waiter so it re-tests its predicate
    pub(crate) fn wake_all(&self) {
        let _state = self.lock();
        self.data_ready.notify_all();
        self.room_or_slot_ready.notify_all();
    }

    /// Point-in-time view of counts and occupancy
    pub fn snapshot(&self) -> BufferSnapshot {
        let state = self.lock();
        let (used, free) = state
            .ring
            .as_ref()
            .map(|ring| (ring.used_space(), ring.free_space()))
            .unwrap_or((0, 0));

        BufferSnapshot {
            allocated: state.ring.is_some(),
            capacity: self.capacity,
            used,
            free,
            readers: state.reader_count,
            writers: state.writer_count,
        }
    }

    /// Snapshot of the lifetime counters
    pub fn stats(&self) -> BufferStats {
        self.stats.snapshot()
    }
}
