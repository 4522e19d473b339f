use intercession_serde::{BitReader, BitWriter, Serde, SerdeErr};

use super::{EventKind, MessageError};

/// Bytes taken by a framed header: a one byte kind tag and a little-endian
/// `u32` body size.
pub const MESSAGE_HEADER_BYTES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    pub kind: EventKind,
    /// Body length in bytes
    pub size: u32,
}

/// A typed message with a sequentially encoded body.
///
/// Values are read back with [`Message::pop`] in the same order they were
/// written with [`Message::push`]. Every pushed value starts on a byte
/// boundary, so `header.size` is always the body length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    header: MessageHeader,
    body: Vec<u8>,
    read_offset: usize,
}

impl Message {
    pub fn new(kind: EventKind) -> Self {
        Self {
            header: MessageHeader { kind, size: 0 },
            body: Vec::new(),
            read_offset: 0,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.header.kind
    }

    pub fn header(&self) -> MessageHeader {
        self.header
    }

    pub fn size(&self) -> usize {
        self.body.len()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether any unread bytes remain in the body
    pub fn has_remaining(&self) -> bool {
        self.read_offset < self.body.len()
    }

    /// Fails with [`MessageError::UnexpectedKind`] unless this message is a `kind`
    pub fn expect_kind(&self, kind: EventKind) -> Result<(), MessageError> {
        if self.header.kind != kind {
            return Err(MessageError::UnexpectedKind {
                expected: kind,
                actual: self.header.kind,
            });
        }
        Ok(())
    }

    /// Appends a value to the body
    pub fn push<T: Serde>(&mut self, value: &T) -> &mut Self {
        let mut writer = BitWriter::new();
        value.ser(&mut writer);
        self.append_bytes(&writer.to_bytes());
        self
    }

    /// Appends raw bytes, usually a body produced by another message
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
        self.header.size = self.body.len() as u32;
    }

    /// Reads the next value
    pub fn pop<T: Serde>(&mut self) -> Result<T, MessageError> {
        let (value, consumed) = self.decode_next()?;
        self.read_offset += consumed;
        Ok(value)
    }

    /// Reads the next value without consuming it
    pub fn peek<T: Serde>(&self) -> Result<T, MessageError> {
        self.decode_next().map(|(value, _)| value)
    }

    /// Moves the read position back to the start of the body
    pub fn rewind(&mut self) {
        self.read_offset = 0;
    }

    fn decode_next<T: Serde>(&self) -> Result<(T, usize), MessageError> {
        let remaining = self.body.get(self.read_offset..).unwrap_or(&[]);
        let mut reader = BitReader::new(remaining);
        match T::de(&mut reader) {
            Ok(value) => Ok((value, reader.bytes_consumed())),
            Err(SerdeErr::OutOfBits { .. }) => Err(MessageError::BodyUnderflow {
                offset: self.read_offset,
                size: self.body.len(),
            }),
            Err(source) => Err(MessageError::Decode {
                kind: self.header.kind,
                source,
            }),
        }
    }

    /// Frames the message as `kind`, `size` (u32 LE), body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MESSAGE_HEADER_BYTES + self.body.len());
        bytes.push(self.header.kind.tag());
        bytes.extend_from_slice(&self.header.size.to_le_bytes());
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Parses a frame produced by [`Message::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        if bytes.len() < MESSAGE_HEADER_BYTES {
            return Err(MessageError::TruncatedHeader {
                length: bytes.len(),
                header: MESSAGE_HEADER_BYTES,
            });
        }
        let kind = EventKind::try_from(bytes[0])?;
        let size = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        let body = &bytes[MESSAGE_HEADER_BYTES..];
        if body.len() != size as usize {
            return Err(MessageError::SizeMismatch {
                declared: size,
                actual: body.len(),
            });
        }

        Ok(Self {
            header: MessageHeader { kind, size },
            body: body.to_vec(),
            read_offset: 0,
        })
    }
}
