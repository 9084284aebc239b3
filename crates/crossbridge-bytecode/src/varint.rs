//! The 6-bit varint scheme used by exception tables.
//!
//! Each byte carries six payload bits, most significant group first. Bit 6
//! marks that another byte follows. Bit 7 flags the first byte of a table
//! entry; it carries no payload and is ignored here.

use crate::error::{CodecError, CodecResult};

pub const PAYLOAD_MASK: u8 = 0x3f;
pub const CONTINUE_BIT: u8 = 0x40;
pub const ENTRY_START_BIT: u8 = 0x80;

/// Lazily decodes the integers of a varint stream.
///
/// After the first error the decoder yields nothing further.
#[derive(Debug, Clone)]
pub struct VarintDecoder<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> VarintDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        VarintDecoder { bytes, position: 0 }
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.bytes.len()
    }

    /// True when the next byte opens a new table entry.
    pub fn at_entry_start(&self) -> bool {
        self.bytes.get(self.position).is_some_and(|b| b & ENTRY_START_BIT != 0)
    }

    fn read_value(&mut self) -> CodecResult<u64> {
        let start = self.position;
        let mut value: u64 = 0;
        loop {
            let Some(&byte) = self.bytes.get(self.position) else {
                self.position = self.bytes.len();
                return Err(CodecError::MalformedEncoding {
                    offset: start,
                    reason: "stream ended inside a varint".to_string(),
                });
            };
            if value > u64::MAX >> 6 {
                self.position = self.bytes.len();
                return Err(CodecError::MalformedEncoding {
                    offset: start,
                    reason: "varint does not fit in 64 bits".to_string(),
                });
            }
            self.position += 1;
            value = (value << 6) | u64::from(byte & PAYLOAD_MASK);
            if byte & CONTINUE_BIT == 0 {
                return Ok(value);
            }
        }
    }
}

impl Iterator for VarintDecoder<'_> {
    type Item = CodecResult<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_exhausted() {
            return None;
        }
        Some(self.read_value())
    }
}

pub fn decode(bytes: &[u8]) -> VarintDecoder<'_> {
    VarintDecoder::new(bytes)
}

/// Decodes a whole stream eagerly.
pub fn decode_all(bytes: &[u8]) -> CodecResult<Vec<u64>> {
    decode(bytes).collect()
}

/// Appends `value` to `out`. `entry_start` sets the entry marker on the
/// first byte written.
pub fn encode(value: u64, entry_start: bool, out: &mut Vec<u8>) {
    let mut groups = 1;
    while groups < 11 && value >> (6 * groups) != 0 {
        groups += 1;
    }
    for index in (0..groups).rev() {
        let mut byte = ((value >> (6 * index)) as u8) & PAYLOAD_MASK;
        if index != 0 {
            byte |= CONTINUE_BIT;
        }
        if entry_start && index == groups - 1 {
            byte |= ENTRY_START_BIT;
        }
        out.push(byte);
    }
}
