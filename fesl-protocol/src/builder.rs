//! Staging builder for outgoing FESL messages.

use crate::error::ProtocolError;
use crate::message::MessageType;
use crate::{MIN_MESSAGE_SIZE, SEPARATOR, TERMINATOR};
use bytes::{BufMut, Bytes, BytesMut};

/// Accumulates key/value pairs for a single message.
///
/// Pairs are written in insertion order. [`MessageBuilder::build`] consumes
/// the builder, so a finished message can't be extended afterwards.
///
/// Keys and values are written one byte per char (the low 8 bits of each
/// code point) and are not escaped. Callers must keep `=` out of keys and
/// `\n` out of both keys and values.
///
/// Lengths count Unicode scalar values, not UTF-16 code units: a character
/// outside the Basic Multilingual Plane counts as one character and takes
/// one byte on the wire, where UTF-16 based encoders emit two.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    cmd: [u8; 4],
    type_and_id: u32,
    length: usize,
    pairs: Vec<(String, String)>,
}

impl MessageBuilder {
    /// Starts a message. `cmd` must be exactly 4 characters.
    ///
    /// `id` is expected to fit in 24 bits. Larger values spill into the
    /// type byte and change the decoded type.
    pub fn new(cmd: &str, msg_type: MessageType, id: u32) -> Result<Self, ProtocolError> {
        let count = cmd.chars().count();
        if count != 4 {
            return Err(ProtocolError::InvalidCommandLength(count));
        }

        let mut code = [0u8; 4];
        for (slot, c) in code.iter_mut().zip(cmd.chars()) {
            *slot = c as u32 as u8;
        }

        Ok(Self {
            cmd: code,
            type_and_id: ((u8::from(msg_type) as u32 & 0xf0) << 24) | id,
            length: MIN_MESSAGE_SIZE,
            pairs: Vec::new(),
        })
    }

    /// Appends a key/value pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        self.length += key.chars().count() + 1 + value.chars().count() + 1;
        self.pairs.push((key, value));
    }

    /// Appends a key/value pair, returning the builder for chaining.
    pub fn pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Total size of the message as it would be built now.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if no pairs have been pushed.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Writes the message into a buffer of exactly [`MessageBuilder::len`] bytes.
    ///
    /// Fails with `MessageTooLarge` if the total does not fit the 32-bit
    /// length field.
    pub fn build(self) -> Result<Bytes, ProtocolError> {
        let length = wire_length(self.length)?;
        let mut buf = BytesMut::with_capacity(self.length);

        // Command (4 bytes)
        buf.put_slice(&self.cmd);

        // Type + id (4 bytes)
        buf.put_u32(self.type_and_id);

        // Total length (4 bytes)
        buf.put_u32(length);

        for (key, value) in &self.pairs {
            put_latin1(&mut buf, key);
            buf.put_u8(SEPARATOR);
            put_latin1(&mut buf, value);
            buf.put_u8(TERMINATOR);
        }

        // Reserved trailing byte
        buf.put_u8(0);

        debug_assert_eq!(buf.len(), self.length);
        tracing::trace!(
            length = self.length,
            pairs = self.pairs.len(),
            "built FESL message"
        );

        Ok(buf.freeze())
    }
}

fn wire_length(length: usize) -> Result<u32, ProtocolError> {
    u32::try_from(length).map_err(|_| ProtocolError::MessageTooLarge {
        size: length,
        max: u32::MAX as usize,
    })
}

fn put_latin1(buf: &mut BytesMut, s: &str) {
    for c in s.chars() {
        buf.put_u8(c as u32 as u8);
    }
}
