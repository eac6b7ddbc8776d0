//! Error types and handling for duplex-pipe

use nix::errno::Errno;

/// Result type alias for pipe operations
pub type Result<T> = std::result::Result<T, PipeError>;

/// Error kinds surfaced by the channel engine
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    /// A non-blocking call could not make progress right now
    #[error("Operation would block: {operation}")]
    WouldBlock { operation: &'static str },

    /// A blocking wait was cancelled by a raised signal
    #[error("Interrupted while waiting: {operation}")]
    Interrupted { operation: &'static str },

    /// Lazy allocation of buffer storage failed
    #[error("Out of memory: failed to allocate {requested} bytes")]
    OutOfMemory { requested: usize },

    /// Operation invoked with a bad parameter or in a mode the session lacks
    #[error("Invalid argument: {parameter} - {message}")]
    InvalidArgument { parameter: String, message: String },

    /// The byte transfer to or from the caller failed
    #[error("Transfer fault: {message}")]
    TransferFault { message: String },
}

impl PipeError {
    /// Create a would-block error
    pub fn would_block(operation: &'static str) -> Self {
        Self::WouldBlock { operation }
    }

    /// Create an interrupted error
    pub fn interrupted(operation: &'static str) -> Self {
        Self::Interrupted { operation }
    }

    /// Create an out-of-memory error
    pub fn out_of_memory(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a transfer fault
    pub fn transfer_fault(message: impl Into<String>) -> Self {
        Self::TransferFault {
            message: message.into(),
        }
    }

    /// Whether the caller may simply try the same call again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WouldBlock { .. } | Self::Interrupted { .. })
    }

    /// Classic status code for hosts that report failures as errno values
    pub fn errno(&self) -> Errno {
        match self {
            Self::WouldBlock { .. } => Errno::EAGAIN,
            Self::Interrupted { .. } => Errno::EINTR,
            Self::OutOfMemory { .. } => Errno::ENOMEM,
            Self::InvalidArgument { .. } => Errno::EINVAL,
            Self::TransferFault { .. } => Errno::EFAULT,
        }
    }
}

impl From<PipeError> for std::io::Error {
    fn from(err: PipeError) -> Self {
        use std::io::ErrorKind;

        let kind = match err {
            PipeError::WouldBlock { .. } => ErrorKind::WouldBlock,
            PipeError::Interrupted { .. } => ErrorKind::Interrupted,
            PipeError::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            PipeError::InvalidArgument { .. } => ErrorKind::InvalidInput,
            PipeError::TransferFault { .. } => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PipeError::out_of_memory(1000);
        assert!(matches!(err, PipeError::OutOfMemory { requested: 1000 }));

        let err = PipeError::invalid_argument("mode", "session not opened for reading");
        assert!(matches!(err, PipeError::InvalidArgument { .. }));

        let err = PipeError::would_block("read");
        assert!(err.is_retryable());
        assert!(PipeError::interrupted("write").is_retryable());
        assert!(!PipeError::transfer_fault("bad address").is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = PipeError::invalid_argument("capacity", "must be at least 2");
        let display = format!("{}", err);
        assert!(display.contains("Invalid argument"));
        assert!(display.contains("capacity"));
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(PipeError::would_block("read").errno(), Errno::EAGAIN);
        assert_eq!(PipeError::interrupted("open").errno(), Errno::EINTR);
        assert_eq!(PipeError::out_of_memory(1).errno(), Errno::ENOMEM);
        assert_eq!(PipeError::invalid_argument("x", "y").errno(), Errno::EINVAL);
        assert_eq!(PipeError::transfer_fault("z").errno(), Errno::EFAULT);
    }

    #[test]
    fn test_io_error_conversion() {
        let io: std::io::Error = PipeError::would_block("write").into();
        assert_eq!(io.kind(), std::io::ErrorKind::WouldBlock);

        let io: std::io::Error = PipeError::interrupted("read").into();
        assert_eq!(io.kind(), std::io::ErrorKind::Interrupted);

        let io: std::io::Error = PipeError::invalid_argument("mode", "write only").into();
        assert_eq!(io.kind(), std::io::ErrorKind::InvalidInput);
    }
}
