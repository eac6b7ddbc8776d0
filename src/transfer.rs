//! Byte transfer seam between the ring storage and the caller's memory
//!
//! The engine never touches caller memory directly. Reads hand a contiguous
//! run of buffered bytes to a [`TransferSink`]; writes ask a
//! [`TransferSource`] to fill a contiguous run of free storage. Either side
//! may fail with [`PipeError::TransferFault`], and because cursors only move
//! after a transfer succeeds, a fault leaves the ring exactly as it was.

use crate::error::{PipeError, Result};

/// Destination for bytes leaving a ring
pub trait TransferSink {
    /// Maximum number of bytes the sink accepts in one call
    fn capacity(&self) -> usize;

    /// Copy `src` to the destination
    ///
    /// `src.len()` never exceeds [`capacity`](Self::capacity).
    fn copy_out(&mut self, src: &[u8]) -> Result<()>;
}

/// Origin of bytes entering a ring
pub trait TransferSource {
    /// Number of bytes still offered by the source
    fn remaining(&self) -> usize;

    /// Fill `dst` with the next `dst.len()` bytes of the source
    ///
    /// `dst.len()` never exceeds [`remaining`](Self::remaining). A successful
    /// call consumes those bytes from the source.
    fn copy_in(&mut self, dst: &mut [u8]) -> Result<()>;
}

impl TransferSink for [u8] {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<()> {
        let held = self.len();
        let dst = self.get_mut(..src.len()).ok_or_else(|| {
            PipeError::transfer_fault(format!(
                "destination holds {} bytes, {} offered",
                held,
                src.len()
            ))
        })?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

/// Appending sink bounded by a byte limit
#[derive(Debug)]
pub struct VecSink<'a> {
    target: &'a mut Vec<u8>,
    limit: usize,
}

impl<'a> VecSink<'a> {
    /// Append at most `limit` bytes to `target`
    pub fn new(target: &'a mut Vec<u8>, limit: usize) -> Self {
        Self { target, limit }
    }
}

impl TransferSink for VecSink<'_> {
    fn capacity(&self) -> usize {
        self.limit
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<()> {
        if src.len() > self.limit {
            return Err(PipeError::transfer_fault("sink limit exceeded"));
        }
        self.target
            .try_reserve(src.len())
            .map_err(|e| PipeError::transfer_fault(e.to_string()))?;
        self.target.extend_from_slice(src);
        self.limit -= src.len();
        Ok(())
    }
}

/// Source reading sequentially from a borrowed slice
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceSource<'a> {
    /// Offer all of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Bytes not yet consumed
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }
}

impl TransferSource for SliceSource<'_> {
    fn remaining(&self) -> usize {
        self.data.len()
    }

    fn copy_in(&mut self, dst: &mut [u8]) -> Result<()> {
        if dst.len() > self.data.len() {
            return Err(PipeError::transfer_fault(format!(
                "source holds {} bytes, {} requested",
                self.data.len(),
                dst.len()
            )));
        }
        let (head, tail) = self.data.split_at(dst.len());
        dst.copy_from_slice(head);
        self.data = tail;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_sink_bounds() {
        let mut buf = [0u8; 4];
        let dst: &mut [u8] = &mut buf;
        dst.copy_out(b"ab").unwrap();
        assert_eq!(&dst[..2], b"ab");
        assert!(matches!(
            dst.copy_out(b"abcde"),
            Err(PipeError::TransferFault { .. })
        ));
    }

    #[test]
    fn test_slice_sink_fault_reports_sizes() {
        let mut buf = [0u8; 2];
        let dst: &mut [u8] = &mut buf;
        match dst.copy_out(b"abc") {
            Err(PipeError::TransferFault { message }) => {
                assert!(message.contains("holds 2 bytes"));
                assert!(message.contains("3 offered"));
            }
            other => panic!("expected transfer fault, got {:?}", other),
        }
        assert_eq!(buf, [0u8; 2]);
    }

    #[test]
    fn test_vec_sink_limit() {
        let mut out = Vec::new();
        let mut sink = VecSink::new(&mut out, 3);
        sink.copy_out(b"xy").unwrap();
        assert_eq!(sink.capacity(), 1);
        assert!(sink.copy_out(b"zz").is_err());
        assert_eq!(out, b"xy");
    }

    #[test]
    fn test_slice_source_consumes() {
        let mut source = SliceSource::new(b"hello");
        let mut dst = [0u8; 3];
        source.copy_in(&mut dst).unwrap();
        assert_eq!(&dst, b"hel");
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.as_slice(), b"lo");
    }
}
