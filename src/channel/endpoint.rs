//! One side of a duplex channel and its admission protocol

use std::sync::Arc;

use log::debug;

use crate::{
    error::{PipeError, Result},
    sync::SynchronizedBuffer,
};

use super::{
    session::{Session, SessionOptions},
    Side,
};

/// An endpoint reads from one buffer and writes to the other
///
/// Cloning is cheap; clones refer to the same buffers.
#[derive(Debug, Clone)]
pub struct ChannelEndpoint {
    side: Side,
    read_buffer: Arc<SynchronizedBuffer>,
    write_buffer: Arc<SynchronizedBuffer>,
}

impl ChannelEndpoint {
    pub(crate) fn new(
        side: Side,
        read_buffer: Arc<SynchronizedBuffer>,
        write_buffer: Arc<SynchronizedBuffer>,
    ) -> Self {
        Self {
            side,
            read_buffer,
            write_buffer,
        }
    }

    /// Side this endpoint belongs to
    pub fn side(&self) -> Side {
        self.side
    }

    /// Buffer this endpoint consumes from
    pub fn read_buffer(&self) -> &Arc<SynchronizedBuffer> {
        &self.read_buffer
    }

    /// Buffer this endpoint produces into
    pub fn write_buffer(&self) -> &Arc<SynchronizedBuffer> {
        &self.write_buffer
    }

    /// Admit a new session
    ///
    /// Read admission happens first and never waits. Write admission may wait
    /// for the writer slot; if it fails the read admission is undone before
    /// the error is returned, so a failed open changes no counts.
    pub fn open(&self, options: SessionOptions) -> Result<Session> {
        if !options.read_mode && !options.write_mode {
            return Err(PipeError::invalid_argument(
                "options",
                "session must be opened for reading, writing or both",
            ));
        }

        let signal = options.signal.unwrap_or_default();

        if options.read_mode {
            self.read_buffer.acquire_as_reader()?;
        }

        if options.write_mode {
            if let Err(err) = self
                .write_buffer
                .acquire_as_writer(options.non_blocking, Some(&signal))
            {
                if options.read_mode {
                    self.read_buffer.release_as_reader();
                }
                debug!("endpoint {}: open rejected: {}", self.side, err);
                return Err(err);
            }
        }

        debug!(
            "endpoint {}: session opened (read: {}, write: {}, non_blocking: {})",
            self.side, options.read_mode, options.write_mode, options.non_blocking
        );

        Ok(Session::new(
            self.clone(),
            options.read_mode,
            options.write_mode,
            options.non_blocking,
            signal,
        ))
    }
}
