//! # fesl-protocol
//!
//! Codec for FESL messages, the framed tag/value format spoken by legacy
//! game-backend session servers.
//!
//! This crate provides:
//! - A zero-copy [`Message`] view with lazy key/value scanning
//! - A [`MessageBuilder`] that materializes wire-ready buffers
//! - A stream [`Decoder`] that splits received bytes into whole messages
//! - Error types and wire constants
//!
//! Delimiter bytes inside keys or values are not escaped. A value that
//! contains `=` or `\n` cannot be represented and will be split
//! incorrectly on decode.

pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod message;

pub use builder::MessageBuilder;
pub use codec::Decoder;
pub use config::{CodecConfig, ConfigError};
pub use error::ProtocolError;
pub use message::{Message, MessageType, Pairs};

/// Size of the fixed message header in bytes (cmd + type/id + length).
pub const HEADER_SIZE: usize = 12;

/// Smallest valid message: header plus the reserved trailing byte.
pub const MIN_MESSAGE_SIZE: usize = HEADER_SIZE + 1;

/// Byte separating a key from its value (`=`).
pub const SEPARATOR: u8 = 0x3d;

/// Byte terminating a value (`\n`).
pub const TERMINATOR: u8 = 0x0a;

/// Mask selecting the id bits of the packed type/id word.
pub const ID_MASK: u32 = 0x00ff_ffff;

/// Default upper bound on a single message (16 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
