//! Frame writer: one encoded, length-prefixed message per call.
//!
//! # Thread Safety
//! - `send` takes `&self`; nothing is kept between calls
//! - Sends on one endpoint must be serialized by the caller

use std::fmt;
use std::time::Instant;

use crate::diagnostics::{Diagnostic, DiagnosticsSink, TracingSink};
use crate::frame::{checked_length, encode_prefix};
use crate::{Direction, Endpoint, FramingConfig, FramingError, FramingResult, MessageCodec};

/// Encodes messages with `C` and writes them as length-prefixed frames.
#[derive(Debug, Clone)]
pub struct FrameWriter<C, S = TracingSink> {
    config: FramingConfig,
    codec: C,
    sink: S,
}

impl<C: MessageCodec> FrameWriter<C> {
    /// Create a writer with the default config, logging through `tracing`.
    #[must_use]
    pub fn new(codec: C) -> Self {
        Self {
            config: FramingConfig::default(),
            codec,
            sink: TracingSink,
        }
    }
}

impl<C: MessageCodec, S: DiagnosticsSink> FrameWriter<C, S> {
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
    pub fn with_sink<T: DiagnosticsSink>(self, sink: T) -> FrameWriter<C, T> {
        FrameWriter {
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

    /// Send one message to `endpoint`.
    ///
    /// Sets the write deadline to now plus the write timeout, encodes the
    /// message, then writes the 8-byte prefix and the payload. Encode
    /// failures and oversized messages are reported before any byte is
    /// written. A failed write is never retried or rolled back.
    ///
    /// # Errors
    ///
    /// - [`FramingError::Encode`] if the codec cannot serialize the message
    /// - [`FramingError::MessageTooLarge`] if the payload exceeds the maximum
    /// - [`FramingError::Timeout`] if the deadline passed mid-write
    /// - [`FramingError::Transport`] for any other I/O failure
    pub fn send<E>(&self, endpoint: &mut E, message: &C::Message) -> FramingResult<()>
    where
        E: Endpoint + ?Sized,
        C::Message: fmt::Debug,
    {
        let peer = endpoint.remote_addr();
        self.write_message(endpoint, &peer, message)
            .inspect_err(|error| {
                self.sink.record(&Diagnostic::Failed { peer: &peer, error });
            })
    }

    fn write_message<E>(&self, endpoint: &mut E, peer: &str, message: &C::Message) -> FramingResult<()>
    where
        E: Endpoint + ?Sized,
        C::Message: fmt::Debug,
    {
        let timeout = self.config.write_timeout;
        endpoint
            .set_write_deadline(Instant::now().checked_add(timeout))
            .map_err(|e| FramingError::transport(Direction::Write, &e))?;

        let payload = self
            .codec
            .encode(message)
            .map_err(|e| FramingError::encode(e.cause))?;
        checked_length(payload.len() as u64, self.config.max_message_size)?;

        self.sink.record(&Diagnostic::Sending {
            peer,
            payload_bytes: payload.len(),
            message,
        });

        endpoint
            .write_all(&encode_prefix(payload.len()))
            .map_err(|e| FramingError::from_write(&e, timeout))?;
        endpoint
            .write_all(&payload)
            .map_err(|e| FramingError::from_write(&e, timeout))?;
        endpoint
            .flush()
            .map_err(|e| FramingError::from_write(&e, timeout))
    }
}
