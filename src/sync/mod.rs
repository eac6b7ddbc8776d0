//! Synchronization layer for channel directions
//!
//! This module wraps the raw byte ring in a mutex with two condition
//! variables and implements the admission protocol for one buffer.
//!
//! Key features:
//! - Lazy allocation, freed when the last reader or writer leaves
//! - Blocking and non-blocking reads and writes using guarded waits
//! - A single writer slot per buffer, so written bytes keep a total order
//! - Interruptible waits through [`Signal`]

pub mod buffer;
pub mod signal;
pub mod stats;

pub use buffer::{BufferSnapshot, SynchronizedBuffer};
pub use signal::Signal;
pub use stats::{AtomicBufferStats, BufferStats};
