//! Fixed-capacity byte ring with reserved-slot full/empty disambiguation
//!
//! One slot of storage is always left unused so that equal cursors can only
//! mean "empty". A ring of capacity `C` therefore holds at most `C - 1` bytes.

use crate::config::MIN_BUFFER_SIZE;
use crate::error::{PipeError, Result};

/// Unsynchronized byte ring
#[derive(Debug)]
pub struct CircularBuffer {
    /// Backing storage, length equals capacity
    storage: Box<[u8]>,
    /// Offset of the next byte to read
    read_cursor: usize,
    /// Offset of the next byte to write
    write_cursor: usize,
}

impl CircularBuffer {
    /// Allocate an empty ring of `capacity` bytes
    pub fn allocate(capacity: usize) -> Result<Self> {
        if capacity < MIN_BUFFER_SIZE {
            return Err(PipeError::invalid_argument(
                "capacity",
                format!("capacity must be at least {}", MIN_BUFFER_SIZE),
            ));
        }

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| PipeError::out_of_memory(capacity))?;
        storage.resize(capacity, 0);

        Ok(Self {
            storage: storage.into_boxed_slice(),
            read_cursor: 0,
            write_cursor: 0,
        })
    }

    /// Total size of the storage, including the reserved slot
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Largest number of bytes the ring can hold at once
    pub fn usable_capacity(&self) -> usize {
        self.capacity() - 1
    }

    /// Number of unread bytes
    pub fn used_space(&self) -> usize {
        let capacity = self.capacity();
        (self.write_cursor + capacity - self.read_cursor) % capacity
    }

    /// Number of bytes that can be written before the ring is full
    pub fn free_space(&self) -> usize {
        self.usable_capacity() - self.used_space()
    }

    /// Whether no unread bytes remain
    pub fn is_empty(&self) -> bool {
        self.read_cursor == self.write_cursor
    }

    /// Whether only the reserved slot is free
    pub fn is_full(&self) -> bool {
        self.free_space() == 0
    }

    /// Unread bytes reachable without crossing the end of storage
    pub fn contiguous_readable_run(&self) -> usize {
        if self.write_cursor >= self.read_cursor {
            self.write_cursor - self.read_cursor
        } else {
            self.capacity() - self.read_cursor
        }
    }

    /// Free bytes reachable without crossing the end of storage or
    /// consuming the reserved slot
    pub fn contiguous_writable_run(&self) -> usize {
        if self.write_cursor >= self.read_cursor {
            if self.read_cursor == 0 {
                self.capacity() - self.write_cursor - 1
            } else {
                self.capacity() - self.write_cursor
            }
        } else {
            self.read_cursor - self.write_cursor - 1
        }
    }

    /// The contiguous readable run as a slice
    pub fn readable_run(&self) -> &[u8] {
        let start = self.read_cursor;
        &self.storage[start..start + self.contiguous_readable_run()]
    }

    /// The contiguous writable run as a slice
    pub fn writable_run(&mut self) -> &mut [u8] {
        let start = self.write_cursor;
        let len = self.contiguous_writable_run();
        &mut self.storage[start..start + len]
    }

    /// Consume `n` bytes
    pub fn advance_read(&mut self, n: usize) {
        debug_assert!(n <= self.used_space(), "advance_read past written data");
        self.read_cursor = (self.read_cursor + n) % self.capacity();
    }

    /// Publish `n` bytes previously copied into [`writable_run`](Self::writable_run)
    pub fn advance_write(&mut self, n: usize) {
        debug_assert!(n <= self.free_space(), "advance_write past free space");
        self.write_cursor = (self.write_cursor + n) % self.capacity();
    }

    /// Index of the next byte to read
    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    /// Index of the next byte to write
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }
}
