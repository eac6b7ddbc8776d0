//! External interruption of blocking waits
//!
//! A [`Signal`] plays the part of a delivered process signal: raising it
//! makes whichever blocking wait its holder is parked in (or the next one it
//! enters) return [`PipeError::Interrupted`](crate::error::PipeError).
//!
//! Waiters register the buffer they are about to park on *before* testing
//! the pending flag, and the raiser sets the flag *before* collecting the
//! registrations. Together with the buffer lock held across register, test
//! and park, this leaves no window in which a raise goes unnoticed.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError, Weak,
};

use log::trace;

use super::buffer::SynchronizedBuffer;

#[derive(Debug, Default)]
struct SignalInner {
    pending: AtomicBool,
    parked: Mutex<Vec<Weak<SynchronizedBuffer>>>,
}

/// Cloneable interruption handle
#[derive(Debug, Clone, Default)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

impl Signal {
    /// Create a signal that is not pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the signal, waking any wait parked under it
    pub fn raise(&self) {
        self.inner.pending.store(true, Ordering::SeqCst);

        let parked = std::mem::take(
            &mut *self
                .inner
                .parked
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        trace!("signal raised, waking {} buffer(s)", parked.len());
        for buffer in parked.iter().filter_map(Weak::upgrade) {
            buffer.wake_all();
        }
    }

    /// Whether a raised signal has not yet been consumed by a wait
    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Discard a pending signal without delivering it
    pub fn clear(&self) {
        self.inner.pending.store(false, Ordering::SeqCst);
    }

    /// Consume a pending signal
    pub(crate) fn take_pending(&self) -> bool {
        self.inner.pending.swap(false, Ordering::SeqCst)
    }

    /// Note that a holder is about to park on `buffer`
    pub(crate) fn park_on(&self, buffer: &Arc<SynchronizedBuffer>) {
        let target = Arc::downgrade(buffer);
        let mut parked = self
            .inner
            .parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        parked.retain(|entry| entry.strong_count() > 0);
        if !parked.iter().any(|entry| entry.ptr_eq(&target)) {
            parked.push(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_pending_lifecycle() {
        let signal = Signal::new();
        assert!(!signal.is_pending());

        signal.raise();
        assert!(signal.is_pending());

        assert!(signal.take_pending());
        assert!(!signal.is_pending());
        assert!(!signal.take_pending());

        signal.raise();
        signal.clear();
        assert!(!signal.is_pending());
    }

    #[test]
    fn test_signal_clones_share_state() {
        let signal = Signal::new();
        let other = signal.clone();
        let unrelated = Signal::new();

        other.raise();
        assert!(signal.is_pending());
        assert!(!unrelated.is_pending());
    }

    #[test]
    fn test_park_on_deduplicates() {
        let signal = Signal::new();
        let buffer = Arc::new(SynchronizedBuffer::new("a", 8));

        signal.park_on(&buffer);
        signal.park_on(&buffer);
        assert_eq!(signal.inner.parked.lock().unwrap().len(), 1);

        signal.raise();
        assert!(signal.inner.parked.lock().unwrap().is_empty());
    }
}
