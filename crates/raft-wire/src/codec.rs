//! Message codecs
//!
//! The framing layer never looks inside a message; it hands the payload to a
//! [`MessageCodec`] and only cares about the encoded length.

use std::fmt;
use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Codec failure, carrying the underlying library's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause}")]
pub struct CodecError {
    pub cause: String,
}

impl CodecError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Converts one application message to and from its payload bytes.
pub trait MessageCodec {
    type Message;

    /// Serialize one message.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the message cannot be represented.
    fn encode(&self, message: &Self::Message) -> Result<Vec<u8>, CodecError>;

    /// Deserialize exactly one message from a whole payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] for malformed bytes, schema mismatches and
    /// trailing bytes after the message.
    fn decode(&self, payload: &[u8]) -> Result<Self::Message, CodecError>;
}

impl<C: MessageCodec + ?Sized> MessageCodec for &C {
    type Message = C::Message;

    fn encode(&self, message: &Self::Message) -> Result<Vec<u8>, CodecError> {
        (**self).encode(message)
    }

    fn decode(&self, payload: &[u8]) -> Result<Self::Message, CodecError> {
        (**self).decode(payload)
    }
}

/// Bincode (standard config) over serde.
pub struct BincodeCodec<T> {
    _message: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _message: PhantomData,
        }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BincodeCodec<T> {}

impl<T> fmt::Debug for BincodeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BincodeCodec")
    }
}

impl<T: Serialize + DeserializeOwned> MessageCodec for BincodeCodec<T> {
    type Message = T;

    fn encode(&self, message: &T) -> Result<Vec<u8>, CodecError> {
        bincode::serde::encode_to_vec(message, bincode::config::standard())
            .map_err(|e| CodecError::new(e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<T, CodecError> {
        let (message, used) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .map_err(|e| CodecError::new(e.to_string()))?;

        if used != payload.len() {
            return Err(CodecError::new(format!(
                "{} trailing bytes after message",
                payload.len().saturating_sub(used)
            )));
        }
        Ok(message)
    }
}

/// JSON over serde, handy when the wire needs to be read by eye.
pub struct JsonCodec<T> {
    _message: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _message: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JsonCodec<T> {}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T: Serialize + DeserializeOwned> MessageCodec for JsonCodec<T> {
    type Message = T;

    fn encode(&self, message: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(message).map_err(|e| CodecError::new(e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(payload).map_err(|e| CodecError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use crate::messages::{RaftMessage, RequestVoteRequest};
    use serde::Deserialize;

    fn vote_request() -> RaftMessage {
        RaftMessage::RequestVoteRequest(RequestVoteRequest {
            term: 3,
            candidate_name: "node-a".to_string(),
            last_log_index: 17,
            last_log_term: 2,
        })
    }

    #[test]
    fn test_bincode_roundtrip() {
        let codec = BincodeCodec::<RaftMessage>::new();
        let bytes = codec.encode(&vote_request()).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), vote_request());
    }

    #[test]
    fn test_bincode_rejects_trailing_bytes() {
        let codec = BincodeCodec::<u32>::new();
        let mut bytes = codec.encode(&7).unwrap();
        bytes.push(0);

        let err = codec.decode(&bytes).unwrap_err();
        assert!(err.cause.contains("trailing"));
    }

    #[test]
    fn test_bincode_rejects_garbage() {
        let codec = BincodeCodec::<RaftMessage>::new();
        assert!(codec.decode(&[0xff; 16]).is_err());
    }

    #[test]
    fn test_json_roundtrip_is_readable() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Ping {
            id: u64,
        }

        let codec = JsonCodec::<Ping>::new();
        let bytes = codec.encode(&Ping { id: 42 }).unwrap();

        assert_eq!(bytes, br#"{"id":42}"#);
        assert_eq!(codec.decode(&bytes).unwrap(), Ping { id: 42 });
    }

    #[test]
    fn test_codec_by_reference() {
        let codec = BincodeCodec::<String>::new();
        let by_ref = &codec;
        let bytes = by_ref.encode(&"hi".to_string()).unwrap();
        assert_eq!(by_ref.decode(&bytes).unwrap(), "hi");
    }
}
