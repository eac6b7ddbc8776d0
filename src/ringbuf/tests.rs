//! Tests for the circular byte ring

#[cfg(test)]
mod tests {
    use crate::error::PipeError;
    use crate::ringbuf::circular::*;

    fn push(ring: &mut CircularBuffer, data: &[u8]) -> usize {
        let mut written = 0;
        while written < data.len() {
            let run = ring.writable_run();
            let n = run.len().min(data.len() - written);
            if n == 0 {
                break;
            }
            run[..n].copy_from_slice(&data[written..written + n]);
            ring.advance_write(n);
            written += n;
        }
        written
    }

    fn pop(ring: &mut CircularBuffer, max: usize) -> Vec<u8> {
        let mut out = Vec::new();
        while out.len() < max {
            let run = ring.readable_run();
            let n = run.len().min(max - out.len());
            if n == 0 {
                break;
            }
            out.extend_from_slice(&run[..n]);
            ring.advance_read(n);
        }
        out
    }

    #[test]
    fn test_circular_buffer_basic() {
        let mut ring = CircularBuffer::allocate(8).unwrap();

        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 8);
        assert_eq!(ring.usable_capacity(), 7);
        assert_eq!(ring.free_space(), 7);
        assert_eq!(ring.used_space(), 0);

        assert_eq!(push(&mut ring, b"abc"), 3);
        assert_eq!(ring.used_space(), 3);
        assert_eq!(ring.free_space(), 4);

        assert_eq!(pop(&mut ring, 3), b"abc");
        assert!(ring.is_empty());
    }

    #[test]
    fn test_circular_buffer_full_is_not_empty() {
        let mut ring = CircularBuffer::allocate(4).unwrap();

        assert_eq!(push(&mut ring, b"wxyz"), 3);
        assert!(ring.is_full());
        assert!(!ring.is_empty());
        assert_eq!(ring.free_space(), 0);
        assert_eq!(ring.used_space(), 3);
        assert_eq!(ring.contiguous_writable_run(), 0);
    }

    #[test]
    fn test_circular_buffer_wrap_around() {
        let mut ring = CircularBuffer::allocate(16).unwrap();

        assert_eq!(push(&mut ring, b"ABCDEFGHIJ"), 10);
        assert_eq!(pop(&mut ring, 6), b"ABCDEF");

        // Only the tail of storage is contiguous before the wrap
        assert_eq!(ring.contiguous_writable_run(), 6);
        assert_eq!(push(&mut ring, b"KLMNOPQR"), 8);
        assert_eq!(ring.write_cursor(), 2);

        assert_eq!(ring.contiguous_readable_run(), 10);
        assert_eq!(pop(&mut ring, 12), b"GHIJKLMNOPQR");
        assert!(ring.is_empty());
    }

    #[test]
    fn test_contiguous_runs_respect_reserved_slot() {
        let mut ring = CircularBuffer::allocate(8).unwrap();
        assert_eq!(ring.contiguous_writable_run(), 7);

        push(&mut ring, b"12345");
        pop(&mut ring, 5);
        // read == write == 5: three bytes to the end, then the wrap
        assert_eq!(ring.contiguous_writable_run(), 3);
        assert_eq!(ring.free_space(), 7);

        push(&mut ring, b"abcdefg");
        assert!(ring.is_full());
        assert_eq!(ring.contiguous_readable_run(), 3);
        assert_eq!(pop(&mut ring, 7), b"abcdefg");
    }

    #[test]
    fn test_invalid_capacity() {
        assert!(matches!(
            CircularBuffer::allocate(1),
            Err(PipeError::InvalidArgument { .. })
        ));
        assert!(matches!(
            CircularBuffer::allocate(usize::MAX),
            Err(PipeError::OutOfMemory { .. })
        ));
    }
}
