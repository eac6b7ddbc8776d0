//! # duplex-pipe - Bounded Full-Duplex Byte Pipe
//!
//! duplex-pipe connects two endpoints with a pair of bounded ring buffers:
//! bytes written at endpoint A become readable at endpoint B and vice versa.
//! It models the behavior of a character-device pipe (open, read, write,
//! close on two device nodes) as an in-process library.
//!
//! ## Features
//!
//! - **Lazy storage**: a direction's ring is allocated by its first holder and
//!   freed by its last, so reopening always starts empty
//! - **Blocking and non-blocking I/O**: guarded condition-variable waits, or
//!   `WouldBlock` when the caller asks not to wait
//! - **Exclusive writer**: at most one writing session per direction, so the
//!   byte stream of each direction has a total order
//! - **Interruptible waits**: a raised [`Signal`] turns a pending wait into
//!   `Interrupted`
//! - **Fault-safe transfers**: cursors only move after the copy to or from the
//!   caller succeeded
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Channel                                       │
//! │   Endpoint A ──write──▶ a_to_b ──read──▶ B    │
//! │   Endpoint A ◀──read─── b_to_a ◀─write── B    │
//! ├───────────────────────────────────────────────┤
//! │ Session: open / read / write / close          │
//! ├───────────────────────────────────────────────┤
//! │ SynchronizedBuffer: lock, condvars, counts    │
//! ├───────────────────────────────────────────────┤
//! │ CircularBuffer: cursors and wraparound        │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use duplex_pipe::{Channel, SessionOptions, Side};
//!
//! let channel = Channel::with_capacity(64)?;
//! let a = channel.open(Side::A, SessionOptions::read_write())?;
//! let b = channel.open(Side::B, SessionOptions::read_write())?;
//!
//! a.write_all(b"ping")?;
//! let mut buf = [0u8; 4];
//! b.read_exact(&mut buf)?;
//! assert_eq!(&buf, b"ping");
//! # Ok::<(), duplex_pipe::PipeError>(())
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod ringbuf;
pub mod sync;
pub mod transfer;

// Main API re-exports
pub use channel::{Channel, ChannelEndpoint, ChannelSnapshot, Session, SessionOptions, Side};
pub use config::{ChannelConfig, ChannelConfigBuilder};
pub use error::{PipeError, Result};
pub use ringbuf::CircularBuffer;
pub use sync::{BufferSnapshot, BufferStats, Signal, SynchronizedBuffer};
pub use transfer::{SliceSource, TransferSink, TransferSource, VecSink};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
