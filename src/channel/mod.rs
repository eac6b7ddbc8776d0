//! Duplex channel: two endpoints over a pair of synchronized buffers
//!
//! ```text
//!            a_to_b
//!   A  ───────────────▶  B
//!      ◀───────────────
//!            b_to_a
//! ```
//!
//! Endpoint A writes into `a_to_b` and reads from `b_to_a`; endpoint B uses
//! the same two buffers in the opposite roles. Each buffer's storage lives
//! only as long as some session on either endpoint holds it.

pub mod endpoint;
pub mod session;

use std::sync::Arc;

use log::debug;

use crate::{
    config::ChannelConfig,
    error::Result,
    sync::{BufferSnapshot, SynchronizedBuffer},
};

pub use endpoint::ChannelEndpoint;
pub use session::{Session, SessionOptions};

/// Identifies one endpoint of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// The endpoint on the other end
    pub fn peer(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Device-minor style index (A is 0, B is 1)
    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    /// Side for a device-minor style index
    pub fn from_index(index: usize) -> Option<Side> {
        match index {
            0 => Some(Side::A),
            1 => Some(Side::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// State of both directions at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub a_to_b: BufferSnapshot,
    pub b_to_a: BufferSnapshot,
}

/// A full-duplex channel with exactly two endpoints
#[derive(Debug)]
pub struct Channel {
    config: ChannelConfig,
    a: ChannelEndpoint,
    b: ChannelEndpoint,
}

impl Channel {
    /// Create a channel; no storage is allocated until a session opens
    pub fn new(config: ChannelConfig) -> Result<Self> {
        config.validate()?;

        let a_to_b = Arc::new(SynchronizedBuffer::new(
            format!("{}:a_to_b", config.name),
            config.a_to_b_capacity,
        ));
        let b_to_a = Arc::new(SynchronizedBuffer::new(
            format!("{}:b_to_a", config.name),
            config.b_to_a_capacity,
        ));

        let a = ChannelEndpoint::new(Side::A, b_to_a.clone(), a_to_b.clone());
        let b = ChannelEndpoint::new(Side::B, a_to_b, b_to_a);

        debug!(
            "channel '{}' created ({} / {} byte rings)",
            config.name, config.a_to_b_capacity, config.b_to_a_capacity
        );

        Ok(Self { config, a, b })
    }

    /// Create a channel with both directions sized to `capacity`
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::new(ChannelConfig::default().with_buffer_size(capacity))
    }

    /// Configuration the channel was built from
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Endpoint for one side
    pub fn endpoint(&self, side: Side) -> &ChannelEndpoint {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    /// Open a session on one endpoint
    pub fn open(&self, side: Side, options: SessionOptions) -> Result<Session> {
        self.endpoint(side).open(options)
    }

    /// The buffer carrying bytes from A to B
    pub fn a_to_b(&self) -> &Arc<SynchronizedBuffer> {
        self.a.write_buffer()
    }

    /// The buffer carrying bytes from B to A
    pub fn b_to_a(&self) -> &Arc<SynchronizedBuffer> {
        self.b.write_buffer()
    }

    /// Point-in-time view of both directions
    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            a_to_b: self.a_to_b().snapshot(),
            b_to_a: self.b_to_a().snapshot(),
        }
    }
}
