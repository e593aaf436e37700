//! Framed stream over an owned endpoint, plus one-shot helpers.
//!
//! # Type Parameters
//! - `E`: endpoint (implements [`Endpoint`])
//! - `C`: message codec (implements [`MessageCodec`])
//! - `S`: diagnostics sink
//!
//! # Thread Safety
//! - `send` and `recv` take `&mut self`, so a single `FramedStream` is
//!   serialized by the borrow checker
//! - For a concurrent reader and writer, clone the endpoint
//!   ([`crate::TcpEndpoint::try_clone`]) and give each half its own
//!   [`FrameReader`] or [`FrameWriter`]

use std::fmt;

use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::{Endpoint, FrameReader, FrameWriter, FramingConfig, FramingResult, MessageCodec};

/// An endpoint that sends and receives whole messages.
///
/// # Example
/// ```rust
/// use raft_wire::{BincodeCodec, FramedStream, RaftMessage, RequestVoteResponse, pipe};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (left, right) = pipe::pair();
/// let mut follower = FramedStream::new(left, BincodeCodec::<RaftMessage>::new());
/// let mut candidate = FramedStream::new(right, BincodeCodec::<RaftMessage>::new());
///
/// let vote = RaftMessage::RequestVoteResponse(RequestVoteResponse {
///     term: 4,
///     vote_granted: true,
/// });
/// follower.send(&vote)?;
/// assert_eq!(candidate.recv()?, vote);
/// # Ok(())
/// # }
/// ```
pub struct FramedStream<E, C, S = TracingSink> {
    endpoint: E,
    reader: FrameReader<C, S>,
    writer: FrameWriter<C, S>,
}

impl<E: Endpoint, C: MessageCodec + Clone> FramedStream<E, C> {
    /// Wrap `endpoint` with the default config, logging through `tracing`.
    pub fn new(endpoint: E, codec: C) -> Self {
        Self {
            endpoint,
            reader: FrameReader::new(codec.clone()),
            writer: FrameWriter::new(codec),
        }
    }
}

impl<E, C, S> FramedStream<E, C, S>
where
    E: Endpoint,
    C: MessageCodec,
    C::Message: fmt::Debug,
    S: DiagnosticsSink,
{
    /// Replace the framing config for both directions.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FramingError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn with_config(self, config: FramingConfig) -> FramingResult<Self> {
        Ok(Self {
            endpoint: self.endpoint,
            reader: self.reader.with_config(config)?,
            writer: self.writer.with_config(config)?,
        })
    }

    /// Replace the diagnostics sink for both directions.
    pub fn with_sink<T: DiagnosticsSink + Clone>(self, sink: T) -> FramedStream<E, C, T> {
        FramedStream {
            endpoint: self.endpoint,
            reader: self.reader.with_sink(sink.clone()),
            writer: self.writer.with_sink(sink),
        }
    }

    /// Send one message.
    ///
    /// # Errors
    ///
    /// See [`FrameWriter::send`].
    pub fn send(&mut self, message: &C::Message) -> FramingResult<()> {
        self.writer.send(&mut self.endpoint, message)
    }

    /// Receive one message.
    ///
    /// # Errors
    ///
    /// See [`FrameReader::receive`].
    pub fn recv(&mut self) -> FramingResult<C::Message> {
        self.reader.receive(&mut self.endpoint)
    }

    /// Peer identity as reported by the endpoint.
    pub fn peer(&self) -> String {
        self.endpoint.remote_addr()
    }

    pub const fn get_ref(&self) -> &E {
        &self.endpoint
    }

    pub fn get_mut(&mut self) -> &mut E {
        &mut self.endpoint
    }

    /// Give back the endpoint, e.g. to close it after a framing error.
    pub fn into_inner(self) -> E {
        self.endpoint
    }
}

impl<E: fmt::Debug, C, S> fmt::Debug for FramedStream<E, C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramedStream")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Send one message with the default config, logging through `tracing`.
///
/// # Errors
///
/// See [`FrameWriter::send`].
pub fn send_message<E, C>(endpoint: &mut E, codec: C, message: &C::Message) -> FramingResult<()>
where
    E: Endpoint + ?Sized,
    C: MessageCodec,
    C::Message: fmt::Debug,
{
    FrameWriter::new(codec).send(endpoint, message)
}

/// Receive one message with the default config, logging through `tracing`.
///
/// # Errors
///
/// See [`FrameReader::receive`].
pub fn receive_message<E, C>(endpoint: &mut E, codec: C) -> FramingResult<C::Message>
where
    E: Endpoint + ?Sized,
    C: MessageCodec,
    C::Message: fmt::Debug,
{
    FrameReader::new(codec).receive(endpoint)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use crate::{BincodeCodec, FramingError, NoopSink, RaftMessage, pipe};

    #[test]
    fn test_bidirectional_communication() {
        let (left, right) = pipe::pair();
        let codec = BincodeCodec::<RaftMessage>::new();
        let mut client = FramedStream::new(left, codec).with_sink(NoopSink);
        let mut server = FramedStream::new(right, codec).with_sink(NoopSink);

        let command = RaftMessage::CommandName("set x = 1".to_string());
        let reply = RaftMessage::CommandName("ok".to_string());

        client.send(&command).unwrap();
        server.send(&reply).unwrap();

        assert_eq!(server.recv().unwrap(), command);
        assert_eq!(client.recv().unwrap(), reply);
        assert_eq!(client.peer(), "memory:1");
    }

    #[test]
    fn test_free_functions_share_the_wire_format() {
        let (mut left, mut right) = pipe::pair();
        let codec = BincodeCodec::<u64>::new();

        send_message(&mut left, codec, &42).unwrap();
        assert_eq!(receive_message(&mut right, codec).unwrap(), 42);
    }

    #[test]
    fn test_with_config_applies_to_both_directions() {
        let (left, _right) = pipe::pair();
        let stream = FramedStream::new(left, BincodeCodec::<u8>::new())
            .with_config(FramingConfig::for_testing())
            .unwrap();

        assert_eq!(stream.reader.config(), &FramingConfig::for_testing());
        assert_eq!(stream.writer.config(), &FramingConfig::for_testing());
    }

    #[test]
    fn test_into_inner_returns_endpoint_for_close() {
        let (left, right) = pipe::pair();
        let stream = FramedStream::new(left, BincodeCodec::<u8>::new()).with_sink(NoopSink);
        stream.into_inner().close();

        let mut peer = FramedStream::new(right, BincodeCodec::<u8>::new()).with_sink(NoopSink);
        assert_eq!(peer.recv(), Err(FramingError::EndOfStream));
    }
}
