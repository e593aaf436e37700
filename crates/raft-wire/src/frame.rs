//! Wire format helpers: `[u64 big-endian length][payload]`.

use crate::{FramingError, FramingResult, LENGTH_PREFIX_SIZE};

/// Encode a payload length as the 8-byte big-endian prefix.
#[must_use]
pub const fn encode_prefix(payload_len: usize) -> [u8; LENGTH_PREFIX_SIZE] {
    (payload_len as u64).to_be_bytes()
}

/// Decode the 8-byte big-endian prefix into the declared payload length.
#[must_use]
pub const fn decode_prefix(prefix: [u8; LENGTH_PREFIX_SIZE]) -> u64 {
    u64::from_be_bytes(prefix)
}

/// Check a declared length against `max_size` and convert it to `usize`.
///
/// # Errors
///
/// Returns [`FramingError::MessageTooLarge`] when `declared > max_size`.
pub(crate) fn checked_length(declared: u64, max_size: usize) -> FramingResult<usize> {
    usize::try_from(declared)
        .ok()
        .filter(|&len| len <= max_size)
        .ok_or(FramingError::message_too_large(declared, max_size))
}

/// Build one complete frame for `payload`.
///
/// # Errors
///
/// Returns [`FramingError::MessageTooLarge`] when the payload exceeds
/// `max_size`.
pub fn encode_frame(payload: &[u8], max_size: usize) -> FramingResult<Vec<u8>> {
    checked_length(payload.len() as u64, max_size)?;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE.saturating_add(payload.len()));
    frame.extend_from_slice(&encode_prefix(payload.len()));
    frame.extend_from_slice(payload);
    Ok(frame)
}
