//! Raft Wire - Length-prefixed message framing over byte streams
//!
//! This crate turns an unstructured, duplex byte stream into discrete,
//! size-bounded and time-bounded messages, one message per call.
//!
//! # Protocol
//!
//! Every message frame consists of:
//! - **Length prefix**: 8-byte big-endian u64 indicating payload size
//! - **Payload**: codec-encoded message data
//!
//! ```text
//! +--------+--------+-----+--------+--------------------------+
//! | Byte 0 | Byte 1 | ... | Byte 7 | Bytes 8..(8+N)           |
//! |--------+--------+-----+--------+--------------------------|
//! |     Length (big-endian u64)    |    Encoded Payload       |
//! |      N = payload size          |    (N bytes)             |
//! +--------+--------+-----+--------+--------------------------+
//! ```
//!
//! # Constraints
//!
//! - Maximum message size: 1MB (1,048,576 bytes) by default
//! - Length prefix is big-endian byte order
//! - No magic number, version byte or checksum
//! - Read and write deadlines (10s by default) bound a whole call, not a single syscall
//!
//! Any error other than [`FramingError::EndOfStream`] leaves the stream in an
//! unknown framing state: close the connection instead of reusing it.
//!
//! # Example
//!
//! ```rust
//! use raft_wire::{BincodeCodec, FramedStream, pipe};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Ping {
//!     id: u64,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (left, right) = pipe::pair();
//! let mut client = FramedStream::new(left, BincodeCodec::<Ping>::new());
//! let mut server = FramedStream::new(right, BincodeCodec::<Ping>::new());
//!
//! client.send(&Ping { id: 42 })?;
//! assert_eq!(server.recv()?, Ping { id: 42 });
//! # Ok(())
//! # }
//! ```

mod codec;
mod config;
mod diagnostics;
mod endpoint;
mod error;
mod frame;
mod messages;
pub mod pipe;
mod reader;
mod transport;
mod writer;

pub use codec::{BincodeCodec, CodecError, JsonCodec, MessageCodec};
pub use config::FramingConfig;
pub use diagnostics::{
    Diagnostic, DiagnosticsSink, NoopSink, RecordedDiagnostic, RecordingSink, TracingSink,
};
pub use endpoint::{Endpoint, TcpEndpoint};
pub use error::{Direction, FramingError, FramingResult};
pub use frame::{decode_prefix, encode_frame, encode_prefix};
pub use messages::{
    AppendEntriesRequest, AppendEntriesResponse, LogEntry, RaftMessage, RequestVoteRequest,
    RequestVoteResponse,
};
pub use reader::FrameReader;
pub use transport::{FramedStream, receive_message, send_message};
pub use writer::FrameWriter;

use std::time::Duration;

/// Maximum allowed payload size in bytes (1MB)
pub const MAX_MESSAGE_SIZE: usize = 1_048_576;

/// Length prefix size in bytes
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Default deadline for receiving one whole frame
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for sending one whole frame
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
