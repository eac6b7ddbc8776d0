//! Open handles on a channel endpoint

use log::{debug, info};

use crate::{
    error::{PipeError, Result},
    sync::Signal,
    transfer::{SliceSource, TransferSink, TransferSource},
};

use super::{endpoint::ChannelEndpoint, Side};

/// How a session is opened
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Admit the session as a reader of the endpoint's read buffer
    pub read_mode: bool,
    /// Admit the session as the writer of the endpoint's write buffer
    pub write_mode: bool,
    /// Fail with `WouldBlock` instead of waiting
    pub non_blocking: bool,
    /// Signal that interrupts the session's waits, including a waiting open.
    /// A fresh one is created when unset.
    pub signal: Option<Signal>,
}

impl SessionOptions {
    /// Options with no mode selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocking read-only open
    pub fn read_only() -> Self {
        Self::new().with_read(true)
    }

    /// Blocking write-only open
    pub fn write_only() -> Self {
        Self::new().with_write(true)
    }

    /// Blocking read-write open
    pub fn read_write() -> Self {
        Self::new().with_read(true).with_write(true)
    }

    /// Set read mode
    pub fn with_read(mut self, read: bool) -> Self {
        self.read_mode = read;
        self
    }

    /// Set write mode
    pub fn with_write(mut self, write: bool) -> Self {
        self.write_mode = write;
        self
    }

    /// Fail with `WouldBlock` instead of waiting
    pub fn with_non_blocking(mut self, non_blocking: bool) -> Self {
        self.non_blocking = non_blocking;
        self
    }

    /// Interrupt blocking calls with `signal`
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// An admitted handle on one endpoint
///
/// Dropping the session (or calling [`close`](Session::close)) releases its
/// admissions exactly once. A session may be shared between threads; all
/// operations take `&self`.
#[derive(Debug)]
pub struct Session {
    endpoint: ChannelEndpoint,
    read_mode: bool,
    write_mode: bool,
    non_blocking: bool,
    signal: Signal,
}

impl Session {
    pub(crate) fn new(
        endpoint: ChannelEndpoint,
        read_mode: bool,
        write_mode: bool,
        non_blocking: bool,
        signal: Signal,
    ) -> Self {
        Self {
            endpoint,
            read_mode,
            write_mode,
            non_blocking,
            signal,
        }
    }

    /// Side this session was opened on
    pub fn side(&self) -> Side {
        self.endpoint.side()
    }

    /// Endpoint this session was opened through
    pub fn endpoint(&self) -> &ChannelEndpoint {
        &self.endpoint
    }

    /// Whether the session holds a reader admission
    pub fn is_readable(&self) -> bool {
        self.read_mode
    }

    /// Whether the session holds the writer slot
    pub fn is_writable(&self) -> bool {
        self.write_mode
    }

    /// Whether calls fail instead of waiting
    pub fn is_non_blocking(&self) -> bool {
        self.non_blocking
    }

    /// Signal whose [`raise`](Signal::raise) interrupts this session's waits
    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    /// Read into `buf` using the session's blocking mode
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.read_into(buf, self.non_blocking)
    }

    /// Write from `data` using the session's blocking mode
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        self.write_from(&mut SliceSource::new(data), self.non_blocking)
    }

    /// Read up to `sink.capacity()` bytes into an arbitrary sink
    pub fn read_into<S: TransferSink + ?Sized>(
        &self,
        sink: &mut S,
        non_blocking: bool,
    ) -> Result<usize> {
        if !self.read_mode {
            return Err(PipeError::invalid_argument(
                "mode",
                "session was not opened for reading",
            ));
        }
        self.endpoint
            .read_buffer()
            .read(sink, non_blocking, Some(&self.signal))
    }

    /// Write up to `source.remaining()` bytes from an arbitrary source
    pub fn write_from<S: TransferSource + ?Sized>(
        &self,
        source: &mut S,
        non_blocking: bool,
    ) -> Result<usize> {
        if !self.write_mode {
            return Err(PipeError::invalid_argument(
                "mode",
                "session was not opened for writing",
            ));
        }
        self.endpoint
            .write_buffer()
            .write(source, non_blocking, Some(&self.signal))
    }

    /// Keep reading until `buf` is full
    ///
    /// Bytes consumed before an error stay consumed.
    pub fn read_exact(&self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            filled += self.read(&mut buf[filled..])?;
        }
        Ok(())
    }

    /// Keep writing until all of `data` has been accepted
    ///
    /// Bytes accepted before an error stay in the buffer.
    pub fn write_all(&self, data: &[u8]) -> Result<()> {
        let mut source = SliceSource::new(data);
        while source.remaining() > 0 {
            self.write_from(&mut source, self.non_blocking)?;
        }
        Ok(())
    }

    /// Control hook; accepts every command and does nothing
    pub fn control(&self, command: u32, argument: u64) -> Result<i64> {
        info!(
            "endpoint {}: control called (command: {:#x}, argument: {:#x})",
            self.side(),
            command,
            argument
        );
        Ok(0)
    }

    /// Release the session's admissions
    pub fn close(self) {
        drop(self)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.read_mode {
            self.endpoint.read_buffer().release_as_reader();
        }
        if self.write_mode {
            self.endpoint.write_buffer().release_as_writer();
        }
        debug!("endpoint {}: session closed", self.side());
    }
}

impl std::io::Read for &Session {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Session::read(*self, buf).map_err(Into::into)
    }
}

impl std::io::Read for Session {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Session::read(self, buf).map_err(Into::into)
    }
}

impl std::io::Write for &Session {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Session::write(*self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::io::Write for Session {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Session::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;

    #[test]
    fn test_mode_mismatch_is_invalid() {
        let channel = Channel::with_capacity(16).unwrap();
        let reader = channel.open(Side::A, SessionOptions::read_only()).unwrap();
        let writer = channel.open(Side::B, SessionOptions::write_only()).unwrap();

        assert!(matches!(
            reader.write(b"x"),
            Err(PipeError::InvalidArgument { .. })
        ));
        let mut buf = [0u8; 4];
        assert!(matches!(
            writer.read(&mut buf),
            Err(PipeError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_open_without_mode_is_invalid() {
        let channel = Channel::with_capacity(16).unwrap();
        assert!(matches!(
            channel.open(Side::A, SessionOptions::new()),
            Err(PipeError::InvalidArgument { .. })
        ));
        assert!(!channel.snapshot().a_to_b.allocated);
    }

    #[test]
    fn test_close_releases_admissions() {
        let channel = Channel::with_capacity(16).unwrap();
        let session = channel.open(Side::A, SessionOptions::read_write()).unwrap();

        let snapshot = channel.snapshot();
        assert_eq!(snapshot.b_to_a.readers, 1);
        assert_eq!(snapshot.a_to_b.writers, 1);

        session.close();
        let snapshot = channel.snapshot();
        assert_eq!(snapshot.b_to_a.readers, 0);
        assert_eq!(snapshot.a_to_b.writers, 0);
        assert!(!snapshot.a_to_b.allocated);
        assert!(!snapshot.b_to_a.allocated);
    }

    #[test]
    fn test_control_is_a_no_op() {
        let channel = Channel::with_capacity(16).unwrap();
        let session = channel.open(Side::B, SessionOptions::read_only()).unwrap();
        assert_eq!(session.control(0x5401, 0).unwrap(), 0);
        assert_eq!(channel.snapshot().a_to_b.readers, 1);
    }

    #[test]
    fn test_io_traits() {
        use std::io::{Read, Write};

        let channel = Channel::with_capacity(32).unwrap();
        let mut writer = channel.open(Side::A, SessionOptions::write_only()).unwrap();
        let reader = channel
            .open(Side::B, SessionOptions::read_only().with_non_blocking(true))
            .unwrap();

        Write::write_all(&mut writer, b"through io").unwrap();
        writer.flush().unwrap();

        let mut io_reader: &Session = &reader;
        let mut out = [0u8; 10];
        Read::read_exact(&mut io_reader, &mut out).unwrap();
        assert_eq!(&out, b"through io");

        let err = Read::read(&mut io_reader, &mut out).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
    }
}
