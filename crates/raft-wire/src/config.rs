//! Framing limits and deadlines.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT, FramingError, MAX_MESSAGE_SIZE};

/// Configuration shared by [`crate::FrameReader`] and [`crate::FrameWriter`].
///
/// Durations are serialized as whole milliseconds so the config can sit in a
/// host configuration file (`read_timeout = 10000`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Deadline for one whole receive call (prefix and payload).
    #[serde(with = "duration_millis")]
    pub read_timeout: Duration,
    /// Deadline for one whole send call (prefix and payload).
    #[serde(with = "duration_millis")]
    pub write_timeout: Duration,
    /// Largest payload accepted from or written to the wire.
    pub max_message_size: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl FramingConfig {
    /// Create a config with custom values.
    #[must_use]
    pub const fn new(read_timeout: Duration, write_timeout: Duration, max_message_size: usize) -> Self {
        Self {
            read_timeout,
            write_timeout,
            max_message_size,
        }
    }

    /// Create a config for testing with short deadlines.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            read_timeout: Duration::from_millis(200),
            write_timeout: Duration::from_millis(200),
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Check that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::InvalidConfig`] for a zero timeout or a zero
    /// maximum message size.
    pub fn validate(&self) -> Result<(), FramingError> {
        if self.read_timeout.is_zero() {
            return Err(FramingError::invalid_config("read timeout must be non-zero"));
        }
        if self.write_timeout.is_zero() {
            return Err(FramingError::invalid_config("write timeout must be non-zero"));
        }
        if self.max_message_size == 0 {
            return Err(FramingError::invalid_config(
                "max message size must be non-zero",
            ));
        }
        Ok(())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn test_default_matches_wire_constants() {
        let config = FramingConfig::default();
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert_eq!(config.max_message_size, 1_048_576);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders_override_single_fields() {
        let config = FramingConfig::default()
            .with_read_timeout(Duration::from_millis(5))
            .with_max_message_size(64);

        assert_eq!(config.read_timeout, Duration::from_millis(5));
        assert_eq!(config.write_timeout, DEFAULT_WRITE_TIMEOUT);
        assert_eq!(config.max_message_size, 64);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let zero_read = FramingConfig::default().with_read_timeout(Duration::ZERO);
        assert!(matches!(
            zero_read.validate(),
            Err(FramingError::InvalidConfig { .. })
        ));

        let zero_size = FramingConfig::default().with_max_message_size(0);
        let err = zero_size.validate().unwrap_err();
        assert!(err.to_string().contains("max message size"));
    }

    #[test]
    fn test_config_serializes_durations_as_millis() {
        let json = serde_json::to_value(FramingConfig::for_testing()).unwrap();
        assert_eq!(json["read_timeout"], 200);
        assert_eq!(json["write_timeout"], 200);

        let parsed: FramingConfig =
            serde_json::from_str(r#"{"read_timeout": 1500}"#).unwrap();
        assert_eq!(parsed.read_timeout, Duration::from_millis(1500));
        assert_eq!(parsed.write_timeout, DEFAULT_WRITE_TIMEOUT);
    }
}
