//! Splits a byte stream into whole FESL messages.
//!
//! The transport feeds whatever it read into [`Decoder::extend`]; complete
//! messages are cut out using the length field at offset 8. No I/O happens
//! here.

use crate::config::CodecConfig;
use crate::error::ProtocolError;
use crate::{HEADER_SIZE, MIN_MESSAGE_SIZE};
use bytes::{Bytes, BytesMut};

/// Buffers received bytes and yields complete message frames.
pub struct Decoder {
    buffer: BytesMut,
    max_message_size: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(config.initial_buffer_capacity),
            max_message_size: config.max_message_size,
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Appends bytes to the internal buffer.
    pub fn extend_bytes(&mut self, data: Bytes) {
        self.buffer.extend_from_slice(&data);
    }

    /// Attempts to cut the next complete message out of the buffer.
    ///
    /// Returns `Ok(None)` if more data is needed. A header declaring an
    /// impossible length is an error and leaves the buffer untouched.
    pub fn decode_frame(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        if self.buffer.len() < HEADER_SIZE {
            return Ok(None);
        }

        let length =
            u32::from_be_bytes([self.buffer[8], self.buffer[9], self.buffer[10], self.buffer[11]])
                as usize;

        if length < MIN_MESSAGE_SIZE {
            return Err(ProtocolError::InvalidLength { length });
        }
        if length > self.max_message_size {
            return Err(ProtocolError::MessageTooLarge {
                size: length,
                max: self.max_message_size,
            });
        }

        if self.buffer.len() < length {
            tracing::trace!(
                length,
                buffered = self.buffer.len(),
                "waiting for rest of FESL message"
            );
            return Ok(None);
        }

        Ok(Some(self.buffer.split_to(length).freeze()))
    }

    /// Decodes every complete message currently buffered.
    pub fn decode_all(&mut self) -> Result<Vec<Bytes>, ProtocolError> {
        let mut frames = Vec::new();
        while let Some(frame) = self.decode_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
