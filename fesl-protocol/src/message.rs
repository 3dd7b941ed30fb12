//! Read-only view over a received FESL message.
//!
//! Message layout (12 bytes header + pairs + reserved byte):
//!
//! ```text
//! +---------+---------------------+----------+
//! | cmd     | type (8) | id (24)  | length   |
//! | 4 bytes | 4 bytes             | 4 bytes  |
//! +---------+---------------------+----------+
//! | key '=' value '\n' ...        | reserved |
//! | length - 13 bytes             | 1 byte   |
//! +-------------------------------+----------+
//! ```

use crate::error::ProtocolError;
use crate::{HEADER_SIZE, ID_MASK, SEPARATOR, TERMINATOR};
use std::fmt;
use std::str::FromStr;

/// Category of a FESL message, carried in the top byte of the type/id word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    SingleClient = 0xc0,
    SingleServer = 0x80,
    MultiClient = 0xf0,
    MultiServer = 0xb0,
}

impl MessageType {
    pub const ALL: [MessageType; 4] = [
        MessageType::SingleClient,
        MessageType::SingleServer,
        MessageType::MultiClient,
        MessageType::MultiServer,
    ];

    /// Returns the kebab-case name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            MessageType::SingleClient => "single-client",
            MessageType::SingleServer => "single-server",
            MessageType::MultiClient => "multi-client",
            MessageType::MultiServer => "multi-server",
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0xc0 => Ok(MessageType::SingleClient),
            0x80 => Ok(MessageType::SingleServer),
            0xf0 => Ok(MessageType::MultiClient),
            0xb0 => Ok(MessageType::MultiServer),
            other => Err(ProtocolError::InvalidType(other)),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        value as u8
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown message type '{}' (expected one of: single-client, single-server, multi-client, multi-server)",
                    s
                )
            })
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A borrowed view over a FESL message buffer.
///
/// The view never copies or mutates the buffer. Header accessors read fixed
/// offsets; key/value pairs are scanned lazily by [`Message::pairs`].
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    data: &'a [u8],
}

impl<'a> Message<'a> {
    /// Wraps a buffer, checking only that the fixed header is present.
    pub fn new(data: &'a [u8]) -> Result<Self, ProtocolError> {
        if data.len() < HEADER_SIZE {
            return Err(ProtocolError::HeaderTooShort { len: data.len() });
        }
        Ok(Self { data })
    }

    /// Returns the 4-byte command code, one Latin-1 char per byte.
    pub fn cmd(&self) -> String {
        self.data[0..4].iter().map(|&b| b as char).collect()
    }

    /// Returns the raw type byte. Membership in [`MessageType`] is not checked.
    pub fn type_code(&self) -> u8 {
        self.data[4]
    }

    /// Returns the type byte as a known [`MessageType`].
    pub fn message_type(&self) -> Result<MessageType, ProtocolError> {
        MessageType::try_from(self.type_code())
    }

    /// Returns the 24-bit message id.
    pub fn id(&self) -> u32 {
        self.word(4) & ID_MASK
    }

    /// Returns the total length declared in the header.
    ///
    /// This is informational; pair scanning is bounded by the buffer itself.
    pub fn length(&self) -> u32 {
        self.word(8)
    }

    /// Returns the underlying buffer.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Returns a fresh iterator over the key/value pairs, starting at the
    /// first byte after the header.
    pub fn pairs(&self) -> Pairs<'a> {
        Pairs {
            data: self.data,
            pos: HEADER_SIZE,
            done: false,
        }
    }

    /// Collects every pair, stopping at the first decode error.
    pub fn collect_pairs(&self) -> Result<Vec<(String, String)>, ProtocolError> {
        self.pairs().collect()
    }

    /// Returns the value of the first pair with the given key.
    pub fn get(&self, key: &str) -> Result<Option<String>, ProtocolError> {
        for pair in self.pairs() {
            let (k, v) = pair?;
            if k == key {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    fn word(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }
}

impl<'a> IntoIterator for &Message<'a> {
    type Item = Result<(String, String), ProtocolError>;
    type IntoIter = Pairs<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs()
    }
}

/// Single-pass cursor over the key/value section of a message.
///
/// The last byte of the buffer is reserved and never scanned. After an
/// error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Pairs<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Pairs<'a> {
    /// Current byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Reads Latin-1 chars up to `delimiter`, leaving the cursor after it.
    fn scan_until(&mut self, delimiter: u8) -> Result<String, ProtocolError> {
        let rest = &self.data[self.pos..];
        match rest.iter().position(|&b| b == delimiter) {
            Some(idx) => {
                let field = rest[..idx].iter().map(|&b| b as char).collect();
                self.pos += idx + 1;
                Ok(field)
            }
            None => {
                self.pos = self.data.len();
                Err(ProtocolError::ExpectedDelimiter {
                    delimiter,
                    offset: self.pos,
                })
            }
        }
    }
}

impl Iterator for Pairs<'_> {
    type Item = Result<(String, String), ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.data.len().saturating_sub(1) {
            return None;
        }

        let pair = self
            .scan_until(SEPARATOR)
            .and_then(|key| self.scan_until(TERMINATOR).map(|value| (key, value)));

        if let Err(ref e) = pair {
            tracing::debug!(error = %e, "FESL pair scan failed");
            self.done = true;
        }
        Some(pair)
    }
}

impl std::iter::FusedIterator for Pairs<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    /// `acct` / SingleClient / id 1 with TXN=NuLogin and user=test.
    fn login_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"acct");
        buf.extend_from_slice(&[0xc0, 0x00, 0x00, 0x01]);
        buf.extend_from_slice(&35u32.to_be_bytes());
        buf.extend_from_slice(b"TXN=NuLogin\nuser=test\n");
        buf.push(0);
        buf
    }

    #[test]
    fn test_header_fields() {
        let data = login_bytes();
        let msg = Message::new(&data).unwrap();

        assert_eq!(msg.cmd(), "acct");
        assert_eq!(msg.type_code(), 0xc0);
        assert_eq!(msg.message_type().unwrap(), MessageType::SingleClient);
        assert_eq!(msg.id(), 1);
        assert_eq!(msg.length(), 35);
        assert_eq!(msg.as_bytes().len(), 35);
    }

    #[test]
    fn test_pairs_in_order() {
        let data = login_bytes();
        let msg = Message::new(&data).unwrap();

        let pairs = msg.collect_pairs().unwrap();
        assert_eq!(
            pairs,
            vec![
                ("TXN".to_string(), "NuLogin".to_string()),
                ("user".to_string(), "test".to_string()),
            ]
        );
    }

    #[test]
    fn test_pairs_restart_from_header() {
        let data = login_bytes();
        let msg = Message::new(&data).unwrap();

        let mut first = msg.pairs();
        let _ = first.next();
        assert!(first.position() > HEADER_SIZE);

        let mut second = msg.pairs();
        assert_eq!(second.position(), HEADER_SIZE);
        let (key, _) = second.next().unwrap().unwrap();
        assert_eq!(key, "TXN");

        // The first cursor was unaffected by the second.
        let (key, _) = first.next().unwrap().unwrap();
        assert_eq!(key, "user");
        assert!(first.next().is_none());
    }

    #[test]
    fn test_get() {
        let data = login_bytes();
        let msg = Message::new(&data).unwrap();

        assert_eq!(msg.get("user").unwrap().as_deref(), Some("test"));
        assert_eq!(msg.get("TXN").unwrap().as_deref(), Some("NuLogin"));
        assert_eq!(msg.get("missing").unwrap(), None);
    }

    #[test]
    fn test_into_iterator() {
        let data = login_bytes();
        let msg = Message::new(&data).unwrap();

        let mut keys = Vec::new();
        for pair in &msg {
            keys.push(pair.unwrap().0);
        }
        assert_eq!(keys, vec!["TXN", "user"]);
    }

    #[test]
    fn test_header_too_short() {
        let result = Message::new(b"acct\xc0\x00");
        assert!(matches!(
            result,
            Err(ProtocolError::HeaderTooShort { len: 6 })
        ));
    }

    #[test]
    fn test_header_only_has_no_pairs() {
        let mut data = b"fsys\x80\x00\x00\x07".to_vec();
        data.extend_from_slice(&12u32.to_be_bytes());
        let msg = Message::new(&data).unwrap();

        assert_eq!(msg.id(), 7);
        assert!(msg.pairs().next().is_none());
    }

    #[test]
    fn test_truncated_value() {
        let mut data = login_bytes();
        // Drop "t\n\0" so the second value never terminates.
        data.truncate(data.len() - 3);

        let msg = Message::new(&data).unwrap();
        let mut pairs = msg.pairs();

        let first = pairs.next().unwrap().unwrap();
        assert_eq!(first.0, "TXN");

        let err = pairs.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            ProtocolError::ExpectedDelimiter {
                delimiter: TERMINATOR,
                offset: data.len(),
            }
        );
        assert!(pairs.next().is_none());
    }

    #[test]
    fn test_truncated_key() {
        let mut data = b"acct\xc0\x00\x00\x01\x00\x00\x00\x13".to_vec();
        data.extend_from_slice(b"TXN");

        let msg = Message::new(&data).unwrap();
        let err = msg.collect_pairs().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ExpectedDelimiter {
                delimiter: SEPARATOR,
                ..
            }
        ));
    }

    #[test]
    fn test_reserved_byte_not_scanned() {
        // The final byte is a separator, which would start a bogus key if scanned.
        let mut data = login_bytes();
        let last = data.len() - 1;
        data[last] = SEPARATOR;

        let msg = Message::new(&data).unwrap();
        assert_eq!(msg.collect_pairs().unwrap().len(), 2);
    }

    #[test]
    fn test_latin1_bytes_map_to_chars() {
        let mut data = b"acct\xc0\x00\x00\x01\x00\x00\x00\x11".to_vec();
        data.extend_from_slice(b"n=\xe9\n\0");

        let msg = Message::new(&data).unwrap();
        assert_eq!(msg.get("n").unwrap().as_deref(), Some("\u{e9}"));
    }

    #[test]
    fn test_unknown_type_is_raw() {
        let mut data = login_bytes();
        data[4] = 0x42;

        let msg = Message::new(&data).unwrap();
        assert_eq!(msg.type_code(), 0x42);
        assert_eq!(msg.id(), 1);
        assert!(matches!(
            msg.message_type(),
            Err(ProtocolError::InvalidType(0x42))
        ));
    }

    #[test]
    fn test_delimiter_in_value_is_not_escaped() {
        // Intended pairs ("k", "a=b") and ("x", "1\n2=3"). The embedded
        // terminator splits the second one in two.
        let mut data = b"acct\xc0\x00\x00\x01\x00\x00\x00\x00".to_vec();
        data.extend_from_slice(b"k=a=b\nx=1\n2=3\n\0");

        let msg = Message::new(&data).unwrap();
        let pairs = msg.collect_pairs().unwrap();
        assert_eq!(pairs[0], ("k".to_string(), "a=b".to_string()));
        assert_eq!(pairs[1], ("x".to_string(), "1".to_string()));
        assert_eq!(pairs[2], ("2".to_string(), "3".to_string()));
    }

    #[test]
    fn test_message_type_conversions() {
        for ty in MessageType::ALL {
            let code: u8 = ty.into();
            assert_eq!(MessageType::try_from(code).unwrap(), ty);
            assert_eq!(ty.name().parse::<MessageType>().unwrap(), ty);
            assert_eq!(ty.to_string(), ty.name());
        }

        assert_eq!(u8::from(MessageType::SingleClient), 0xc0);
        assert_eq!(u8::from(MessageType::SingleServer), 0x80);
        assert_eq!(u8::from(MessageType::MultiClient), 0xf0);
        assert_eq!(u8::from(MessageType::MultiServer), 0xb0);

        assert_eq!(
            "SINGLE-SERVER".parse::<MessageType>().unwrap(),
            MessageType::SingleServer
        );
        assert!("broadcast".parse::<MessageType>().is_err());
    }
}
