//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding, building or splitting FESL messages.
///
/// `ExpectedUtf8` is part of the taxonomy for stricter validation layers and
/// is not produced by the decoder itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("expected delimiter {delimiter:#04x} before end of buffer (offset {offset})")]
    ExpectedDelimiter { delimiter: u8, offset: usize },

    #[error("expected UTF-8 in message field")]
    ExpectedUtf8,

    #[error("invalid command length: expected 4 characters, got {0}")]
    InvalidCommandLength(usize),

    #[error("invalid message type: {0:#04x}")]
    InvalidType(u8),

    #[error("buffer too short for header: {len} bytes (need {})", crate::HEADER_SIZE)]
    HeaderTooShort { len: usize },

    #[error("invalid message length: {length} bytes (min {})", crate::MIN_MESSAGE_SIZE)]
    InvalidLength { length: usize },

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}
