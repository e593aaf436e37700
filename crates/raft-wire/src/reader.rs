//! Frame reader: one complete, decoded message per call.
//!
//! # Thread Safety
//! - `receive` takes `&self`; nothing is kept between calls
//! - Receives on one endpoint must be serialized by the caller

use std::fmt;
use std::io::{self, Read};
use std::time::Instant;

use crate::diagnostics::{Diagnostic, DiagnosticsSink, TracingSink};
use crate::frame::{checked_length, decode_prefix};
use crate::{
    Direction, Endpoint, FramingConfig, FramingError, FramingResult, LENGTH_PREFIX_SIZE,
    MessageCodec,
};

/// Reads length-prefixed frames and decodes them with `C`.
///
/// # Example
/// ```rust
/// use raft_wire::{BincodeCodec, FrameReader, FrameWriter, pipe};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut left, mut right) = pipe::pair();
/// FrameWriter::new(BincodeCodec::<String>::new()).send(&mut left, &"hello".to_string())?;
///
/// let reader = FrameReader::new(BincodeCodec::<String>::new());
/// assert_eq!(reader.receive(&mut right)?, "hello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FrameReader<C, S = TracingSink> {
    config: FramingConfig,
    codec: C,
    sink: S,
}

impl<C: MessageCodec> FrameReader<C> {
    /// Create a reader with the default config, logging through `tracing`.
    #[must_use]
    pub fn new(codec: C) -> Self {
        Self {
            config: FramingConfig::default(),
            codec,
            sink: TracingSink,
        }
    }
}

impl<C: MessageCodec, S: DiagnosticsSink> FrameReader<C, S> {
    /// Replace the framing config.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(mut self, config: FramingConfig) -> FramingResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Replace the diagnostics sink.
    pub fn with_sink<T: DiagnosticsSink>(self, sink: T) -> FrameReader<C, T> {
        FrameReader {
            config: self.config,
            codec: self.codec,
            sink,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &FramingConfig {
        &self.config
    }

    #[must_use]
    pub const fn codec(&self) -> &C {
        &self.codec
    }

    /// Receive one message from `endpoint`.
    ///
    /// Sets the read deadline to now plus the read timeout; the prefix and
    /// the payload both race against that single instant. A prefix larger
    /// than the maximum is rejected without reading the payload.
    ///
    /// # Errors
    ///
    /// - [`FramingError::EndOfStream`] if the peer closed before the first byte (not logged)
    /// - [`FramingError::TruncatedMessage`] if the peer closed mid-frame
    /// - [`FramingError::Timeout`] if the deadline passed
    /// - [`FramingError::MessageTooLarge`] if the prefix exceeds the maximum
    /// - [`FramingError::Decode`] if the codec rejects the payload
    /// - [`FramingError::Transport`] for any other I/O failure
    pub fn receive<E>(&self, endpoint: &mut E) -> FramingResult<C::Message>
    where
        E: Endpoint + ?Sized,
        C::Message: fmt::Debug,
    {
        let peer = endpoint.remote_addr();
        self.read_message(endpoint, &peer).inspect_err(|error| {
            if !error.is_end_of_stream() {
                self.sink.record(&Diagnostic::Failed { peer: &peer, error });
            }
        })
    }

    fn read_message<E>(&self, endpoint: &mut E, peer: &str) -> FramingResult<C::Message>
    where
        E: Endpoint + ?Sized,
        C::Message: fmt::Debug,
    {
        let timeout = self.config.read_timeout;
        endpoint
            .set_read_deadline(Instant::now().checked_add(timeout))
            .map_err(|e| FramingError::transport(Direction::Read, &e))?;

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        read_full(endpoint, &mut prefix).map_err(|(filled, e)| {
            FramingError::from_read(&e, filled, LENGTH_PREFIX_SIZE, timeout)
        })?;

        let payload_len = checked_length(decode_prefix(prefix), self.config.max_message_size)?;
        let frame_len = LENGTH_PREFIX_SIZE.saturating_add(payload_len);

        let mut payload = vec![0u8; payload_len];
        read_full(endpoint, &mut payload).map_err(|(filled, e)| {
            FramingError::from_read(&e, LENGTH_PREFIX_SIZE.saturating_add(filled), frame_len, timeout)
        })?;

        let message = self
            .codec
            .decode(&payload)
            .map_err(|e| FramingError::decode(e.cause, payload_len))?;

        self.sink.record(&Diagnostic::Received {
            peer,
            payload_bytes: payload_len,
            message: &message,
        });
        Ok(message)
    }
}

/// Fill `buf` completely, retrying short reads and interrupts.
///
/// On failure returns how many bytes were read before it, with end of stream
/// reported as `UnexpectedEof`.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<(), (usize, io::Error)> {
    let mut filled = 0usize;
    while let Some(rest) = buf.get_mut(filled..).filter(|rest| !rest.is_empty()) {
        match reader.read(rest) {
            Ok(0) => return Err((filled, io::Error::from(io::ErrorKind::UnexpectedEof))),
            Ok(n) => filled = filled.saturating_add(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err((filled, e)),
        }
    }
    Ok(())
}
