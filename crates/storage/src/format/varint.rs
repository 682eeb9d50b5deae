//! LEB128 variable-length integers.

use trailstore_core::{Error, Result};

/// Encode an unsigned 64-bit integer as LEB128 into `buf`.
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a LEB128 unsigned 64-bit integer from `buf` starting at `*pos`.
/// Advances `*pos` past the consumed bytes.
#[inline]
pub fn decode_varint(buf: &[u8], pos: &mut usize) -> Result<u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *buf
            .get(*pos)
            .ok_or_else(|| Error::corrupt("varint runs past end of section"))?;
        *pos += 1;

        let payload = (byte & 0x7F) as u64;
        if shift >= 64 || (shift == 63 && payload > 1) {
            return Err(Error::corrupt("varint overflow"));
        }
        result |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Decode a varint that must fit in a `u32`.
#[inline]
pub fn decode_varint_u32(buf: &[u8], pos: &mut usize) -> Result<u32> {
    let value = decode_varint(buf, pos)?;
    u32::try_from(value).map_err(|_| Error::corrupt(format!("value {} exceeds u32", value)))
}
