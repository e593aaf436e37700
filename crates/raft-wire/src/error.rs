//! Framing errors
//!
//! Every failure is terminal for the call that produced it. Apart from
//! [`FramingError::EndOfStream`], callers should treat an error as fatal for
//! the connection: a half-written prefix or half-read payload desynchronizes
//! every later frame.

use std::fmt;
use std::io::{self, ErrorKind as IoErrorKind};
use std::time::Duration;

use thiserror::Error;

/// Which half of the stream an operation was using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Framing layer errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FramingError {
    /// Peer closed the stream cleanly before sending any byte of a new frame.
    ///
    /// This is the orderly "no more messages" signal and is never logged as
    /// an error.
    #[error("end of stream")]
    EndOfStream,

    /// Peer closed the stream part way through a frame.
    #[error("truncated message: {bytes_read} bytes read, expected {expected_bytes}")]
    TruncatedMessage {
        /// Bytes of the frame (prefix included) consumed before end of stream
        bytes_read: usize,
        /// Bytes the frame should have had; the prefix size while it is incomplete
        expected_bytes: usize,
    },

    /// The deadline for the whole call elapsed.
    #[error("{direction} timed out after {timeout:?}")]
    Timeout {
        direction: Direction,
        /// Configured deadline for the call
        timeout: Duration,
    },

    /// Payload length exceeds the configured maximum.
    ///
    /// On receive the payload is never read; on send nothing is written.
    #[error("message too large: {size} bytes (max {max_size} bytes)")]
    MessageTooLarge {
        /// Declared or encoded payload size in bytes
        size: u64,
        /// Maximum allowed size
        max_size: usize,
    },

    /// The codec rejected the payload.
    #[error("decode failed at {payload_bytes} bytes: {cause}")]
    Decode {
        /// Codec error message
        cause: String,
        /// Size of the rejected payload
        payload_bytes: usize,
    },

    /// The codec could not serialize the message. Nothing was written.
    #[error("encode failed: {cause}")]
    Encode {
        /// Codec error message
        cause: String,
    },

    /// Any other I/O failure (reset, broken pipe, closed socket).
    #[error("{direction} failed: {kind:?} (error code: {error_code:?})")]
    Transport {
        direction: Direction,
        /// Error kind
        kind: IoErrorKind,
        /// OS error code
        error_code: Option<i32>,
    },

    /// A framing limit is unusable.
    #[error("invalid framing config: {reason}")]
    InvalidConfig { reason: String },
}

impl FramingError {
    /// Create a `MessageTooLarge` error
    #[must_use]
    pub const fn message_too_large(size: u64, max_size: usize) -> Self {
        Self::MessageTooLarge { size, max_size }
    }

    /// Create a `TruncatedMessage` error
    #[must_use]
    pub const fn truncated(bytes_read: usize, expected_bytes: usize) -> Self {
        Self::TruncatedMessage {
            bytes_read,
            expected_bytes,
        }
    }

    /// Create a `Timeout` error
    #[must_use]
    pub const fn timeout(direction: Direction, timeout: Duration) -> Self {
        Self::Timeout { direction, timeout }
    }

    /// Create a `Decode` error
    pub fn decode(cause: impl Into<String>, payload_bytes: usize) -> Self {
        Self::Decode {
            cause: cause.into(),
            payload_bytes,
        }
    }

    /// Create an `Encode` error
    pub fn encode(cause: impl Into<String>) -> Self {
        Self::Encode {
            cause: cause.into(),
        }
    }

    /// Create a `Transport` error from `std::io::Error`
    #[must_use]
    pub fn transport(direction: Direction, err: &io::Error) -> Self {
        Self::Transport {
            direction,
            kind: err.kind(),
            error_code: err.raw_os_error(),
        }
    }

    /// Create an `InvalidConfig` error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Classify an I/O failure raised while reading a frame.
    ///
    /// `bytes_read` counts frame bytes consumed before the failure and
    /// `expected_bytes` the size of the part being read, both from the start
    /// of the frame.
    #[must_use]
    pub fn from_read(
        err: &io::Error,
        bytes_read: usize,
        expected_bytes: usize,
        timeout: Duration,
    ) -> Self {
        match err.kind() {
            IoErrorKind::UnexpectedEof if bytes_read == 0 => Self::EndOfStream,
            IoErrorKind::UnexpectedEof => Self::truncated(bytes_read, expected_bytes),
            kind if is_timeout_kind(kind) => Self::timeout(Direction::Read, timeout),
            _ => Self::transport(Direction::Read, err),
        }
    }

    /// Classify an I/O failure raised while writing a frame.
    #[must_use]
    pub fn from_write(err: &io::Error, timeout: Duration) -> Self {
        if is_timeout_kind(err.kind()) {
            Self::timeout(Direction::Write, timeout)
        } else {
            Self::transport(Direction::Write, err)
        }
    }

    /// Whether this is the orderly end-of-stream signal.
    #[must_use]
    pub const fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the connection must be closed after this error.
    ///
    /// Encode and config errors happen before any byte touches the stream.
    #[must_use]
    pub const fn is_connection_fatal(&self) -> bool {
        !matches!(self, Self::Encode { .. } | Self::InvalidConfig { .. })
    }
}

/// Sockets with `SO_RCVTIMEO` report `WouldBlock` on Unix and `TimedOut` on Windows.
const fn is_timeout_kind(kind: IoErrorKind) -> bool {
    matches!(kind, IoErrorKind::TimedOut | IoErrorKind::WouldBlock)
}

/// Result type for framing operations
pub type FramingResult<T> = Result<T, FramingError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn test_error_display_messages() {
        assert_eq!(
            FramingError::message_too_large(2_000_000, 1_048_576).to_string(),
            "message too large: 2000000 bytes (max 1048576 bytes)"
        );

        assert_eq!(
            FramingError::truncated(108, 1008).to_string(),
            "truncated message: 108 bytes read, expected 1008"
        );

        assert_eq!(
            FramingError::timeout(Direction::Read, Duration::from_secs(10)).to_string(),
            "read timed out after 10s"
        );

        assert_eq!(
            FramingError::decode("bad tag", 100).to_string(),
            "decode failed at 100 bytes: bad tag"
        );

        assert_eq!(FramingError::EndOfStream.to_string(), "end of stream");
    }

    #[test]
    fn test_read_eof_before_any_byte_is_end_of_stream() {
        let eof = io::Error::from(IoErrorKind::UnexpectedEof);
        let err = FramingError::from_read(&eof, 0, 8, Duration::from_secs(1));
        assert!(err.is_end_of_stream());
    }

    #[test]
    fn test_read_eof_mid_frame_is_truncation() {
        let eof = io::Error::from(IoErrorKind::UnexpectedEof);

        let in_prefix = FramingError::from_read(&eof, 3, 8, Duration::from_secs(1));
        assert_eq!(in_prefix, FramingError::truncated(3, 8));

        let in_payload = FramingError::from_read(&eof, 8, 20, Duration::from_secs(1));
        assert_eq!(in_payload, FramingError::truncated(8, 20));
    }

    #[test]
    fn test_would_block_and_timed_out_are_timeouts() {
        for kind in [IoErrorKind::WouldBlock, IoErrorKind::TimedOut] {
            let err = FramingError::from_read(&io::Error::from(kind), 4, 8, Duration::from_secs(2));
            assert_eq!(err, FramingError::timeout(Direction::Read, Duration::from_secs(2)));

            let err = FramingError::from_write(&io::Error::from(kind), Duration::from_secs(3));
            assert!(err.is_timeout());
        }
    }

    #[test]
    fn test_other_io_errors_are_transport_errors() {
        let reset = io::Error::from(IoErrorKind::ConnectionReset);
        let err = FramingError::from_read(&reset, 0, 8, Duration::from_secs(1));
        assert!(matches!(
            err,
            FramingError::Transport {
                direction: Direction::Read,
                kind: IoErrorKind::ConnectionReset,
                ..
            }
        ));

        let broken = io::Error::from(IoErrorKind::BrokenPipe);
        let err = FramingError::from_write(&broken, Duration::from_secs(1));
        assert!(err.is_connection_fatal());
        assert!(err.to_string().starts_with("write failed: BrokenPipe"));
    }

    #[test]
    fn test_encode_failure_is_not_connection_fatal() {
        assert!(!FramingError::encode("unsupported").is_connection_fatal());
        assert!(FramingError::decode("bad", 1).is_connection_fatal());
    }
}
