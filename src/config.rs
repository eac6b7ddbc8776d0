//! Channel configuration

use crate::error::{PipeError, Result};

/// Default capacity of each direction's ring, in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Smallest capacity that leaves a usable byte next to the reserved slot
pub const MIN_BUFFER_SIZE: usize = 2;

/// Environment variable consulted by [`ChannelConfig::from_env`]
pub const BUFFER_SIZE_ENV: &str = "DUPLEX_PIPE_BUFFER_SIZE";

/// Configuration for a duplex channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Name used in log output
    pub name: String,
    /// Capacity of the ring carrying bytes from endpoint A to endpoint B
    pub a_to_b_capacity: usize,
    /// Capacity of the ring carrying bytes from endpoint B to endpoint A
    pub b_to_a_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "duplex".to_string(),
            a_to_b_capacity: DEFAULT_BUFFER_SIZE,
            b_to_a_capacity: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ChannelConfig {
    /// Create a new configuration with custom name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Default configuration with the buffer size taken from the environment,
    /// falling back to [`DEFAULT_BUFFER_SIZE`] when the variable is unset
    pub fn from_env() -> Result<Self> {
        match std::env::var(BUFFER_SIZE_ENV) {
            Ok(value) => {
                let size = parse_buffer_size(&value)?;
                Ok(Self::default().with_buffer_size(size))
            }
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(std::env::VarError::NotUnicode(_)) => Err(PipeError::invalid_argument(
                BUFFER_SIZE_ENV,
                "value is not valid unicode",
            )),
        }
    }

    /// Set the capacity of both directions
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.a_to_b_capacity = size;
        self.b_to_a_capacity = size;
        self
    }

    /// Set the capacity of each direction separately
    pub fn with_capacities(mut self, a_to_b: usize, b_to_a: usize) -> Self {
        self.a_to_b_capacity = a_to_b;
        self.b_to_a_capacity = b_to_a;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.a_to_b_capacity < MIN_BUFFER_SIZE {
            return Err(PipeError::invalid_argument(
                "a_to_b_capacity",
                format!("capacity must be at least {}", MIN_BUFFER_SIZE),
            ));
        }

        if self.b_to_a_capacity < MIN_BUFFER_SIZE {
            return Err(PipeError::invalid_argument(
                "b_to_a_capacity",
                format!("capacity must be at least {}", MIN_BUFFER_SIZE),
            ));
        }

        Ok(())
    }
}

/// Builder pattern for channel configuration
pub struct ChannelConfigBuilder {
    config: ChannelConfig,
}

impl ChannelConfigBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: ChannelConfig::new(name),
        }
    }

    /// Set the capacity of both directions
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config = self.config.with_buffer_size(size);
        self
    }

    /// Set the A to B capacity
    pub fn a_to_b_capacity(mut self, size: usize) -> Self {
        self.config.a_to_b_capacity = size;
        self
    }

    /// Set the B to A capacity
    pub fn b_to_a_capacity(mut self, size: usize) -> Self {
        self.config.b_to_a_capacity = size;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ChannelConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Parse a buffer size given as decimal text
pub fn parse_buffer_size(value: &str) -> Result<usize> {
    let size = value.trim().parse::<usize>().map_err(|e| {
        PipeError::invalid_argument("buffer_size", format!("'{}': {}", value, e))
    })?;

    if size < MIN_BUFFER_SIZE {
        return Err(PipeError::invalid_argument(
            "buffer_size",
            format!("capacity must be at least {}", MIN_BUFFER_SIZE),
        ));
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChannelConfig::default();
        assert_eq!(config.a_to_b_capacity, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.b_to_a_capacity, DEFAULT_BUFFER_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validates() {
        let config = ChannelConfigBuilder::new("test")
            .buffer_size(64)
            .b_to_a_capacity(32)
            .build()
            .unwrap();
        assert_eq!(config.name, "test");
        assert_eq!(config.a_to_b_capacity, 64);
        assert_eq!(config.b_to_a_capacity, 32);

        let err = ChannelConfigBuilder::new("bad").a_to_b_capacity(1).build();
        assert!(matches!(err, Err(PipeError::InvalidArgument { .. })));
    }

    #[test]
    fn test_parse_buffer_size() {
        assert_eq!(parse_buffer_size("4096").unwrap(), 4096);
        assert_eq!(parse_buffer_size(" 16\n").unwrap(), 16);
        assert!(parse_buffer_size("1").is_err());
        assert!(parse_buffer_size("lots").is_err());
        assert!(parse_buffer_size("-5").is_err());
    }
}
