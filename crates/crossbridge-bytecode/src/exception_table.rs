//! Exception-table entries.
//!
//! Each entry is four varints: start, length, handler target and a packed
//! `depth << 1 | lasti`. Offsets are in code units.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};
use crate::varint::{self, VarintDecoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionTableEntry {
    pub start: u32,
    /// Last protected code unit, inclusive.
    pub end: u32,
    pub target: u32,
    pub depth: u32,
    pub lasti: bool,
}

impl ExceptionTableEntry {
    pub fn covers(&self, unit: u32) -> bool {
        self.start <= unit && unit <= self.end
    }
}

pub fn parse(bytes: &[u8]) -> CodecResult<Vec<ExceptionTableEntry>> {
    let mut decoder = VarintDecoder::new(bytes);
    let mut entries = Vec::new();
    while !decoder.is_exhausted() {
        let entry_offset = decoder.position();
        if !decoder.at_entry_start() {
            return Err(CodecError::MalformedEncoding {
                offset: entry_offset,
                reason: "expected the start of an exception-table entry".to_string(),
            });
        }
        let mut fields = [0u64; 4];
        for field in fields.iter_mut() {
            *field = match decoder.next() {
                Some(value) => value?,
                None => {
                    return Err(CodecError::MalformedEncoding {
                        offset: entry_offset,
                        reason: "stream ended inside an exception-table entry".to_string(),
                    })
                }
            };
        }
        let [start, length, target, depth_lasti] = fields.map(|field| narrow(field, entry_offset));
        let (start, length, target, depth_lasti) = (start?, length?, target?, depth_lasti?);
        let end = length
            .checked_sub(1)
            .and_then(|span| start.checked_add(span))
            .ok_or_else(|| CodecError::MalformedEncoding {
                offset: entry_offset,
                reason: format!("exception-table entry at unit {start} has invalid length {length}"),
            })?;
        entries.push(ExceptionTableEntry {
            start,
            end,
            target,
            depth: depth_lasti >> 1,
            lasti: depth_lasti & 1 == 1,
        });
    }
    Ok(entries)
}

/// Fails on an inverted range, or on a depth too deep to pack.
pub fn encode(entries: &[ExceptionTableEntry]) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    for entry in entries {
        let offset = out.len();
        let length = entry.end.checked_sub(entry.start).and_then(|span| span.checked_add(1)).ok_or_else(|| {
            CodecError::MalformedEncoding {
                offset,
                reason: format!("exception-table entry ends at unit {} before it starts at {}", entry.end, entry.start),
            }
        })?;
        let depth = entry.depth.checked_mul(2).ok_or_else(|| CodecError::MalformedEncoding {
            offset,
            reason: format!("exception-table depth {} does not fit an entry", entry.depth),
        })?;
        varint::encode(u64::from(entry.start), true, &mut out);
        varint::encode(u64::from(length), false, &mut out);
        varint::encode(u64::from(entry.target), false, &mut out);
        varint::encode(u64::from(depth | u32::from(entry.lasti)), false, &mut out);
    }
    Ok(out)
}

fn narrow(value: u64, offset: usize) -> CodecResult<u32> {
    u32::try_from(value).map_err(|_| CodecError::MalformedEncoding {
        offset,
        reason: format!("exception-table field {value} is out of range"),
    })
}
