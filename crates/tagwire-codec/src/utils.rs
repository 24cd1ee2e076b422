//! Unframed building blocks shared by every codec.
//!
//! Decoding helpers take a cursor (`&mut &[u8]`) and advance it past what
//! they consume, so callers always hold the unconsumed remainder.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{CodecError, Result};

/// Size of every length, count and `int` field on the wire.
pub const INT_SIZE: usize = 4;

/// Encode a non-negative integer as 4 big-endian bytes.
///
/// Negative values and values above `u32::MAX` are rejected: this encoding
/// carries lengths and counts.
pub fn int_to_bytes(value: i64) -> Result<[u8; INT_SIZE]> {
    u32::try_from(value)
        .map(u32::to_be_bytes)
        .map_err(|_| CodecError::OutOfRange {
            codec: "int",
            value: value.to_string(),
        })
}

/// Decode exactly 4 big-endian bytes produced by [`int_to_bytes`].
pub fn bytes_to_int(bytes: &[u8]) -> Result<u32> {
    let raw: [u8; INT_SIZE] = bytes.try_into().map_err(|_| CodecError::InvalidData {
        context: "int",
        message: format!("expected {INT_SIZE} bytes, found {}", bytes.len()),
    })?;
    Ok(u32::from_be_bytes(raw))
}

/// UTF-8 encode a string.
pub fn str_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Decode UTF-8 bytes into a string.
pub fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    Ok(std::str::from_utf8(bytes)?.to_owned())
}

/// UTF-8 encode a string and also return its encoded length as 4 bytes.
pub fn str_len_to_bytes(text: &str) -> Result<(Vec<u8>, [u8; INT_SIZE])> {
    let encoded = str_to_bytes(text);
    let length = len_to_bytes(encoded.len())?;
    Ok((encoded, length))
}

/// Encode a length or count as 4 big-endian bytes.
pub fn len_to_bytes(len: usize) -> Result<[u8; INT_SIZE]> {
    u32::try_from(len)
        .map(u32::to_be_bytes)
        .map_err(|_| CodecError::OutOfRange {
            codec: "length",
            value: len.to_string(),
        })
}

/// Append a 4-byte length or count.
pub fn put_len(dst: &mut BytesMut, len: usize) -> Result<()> {
    dst.put_slice(&len_to_bytes(len)?);
    Ok(())
}

/// Append `data` preceded by its 4-byte length.
pub fn write_segment(dst: &mut BytesMut, data: &[u8]) -> Result<()> {
    dst.reserve(INT_SIZE + data.len());
    put_len(dst, data.len())?;
    dst.put_slice(data);
    Ok(())
}

/// Fail with [`CodecError::Truncated`] unless `needed` bytes remain.
pub fn at_least(src: &[u8], needed: usize) -> Result<()> {
    if src.len() < needed {
        return Err(CodecError::Truncated {
            needed,
            remaining: src.len(),
        });
    }
    Ok(())
}

/// Consume exactly `n` bytes from the cursor.
pub fn take<'a>(src: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    at_least(src, n)?;
    let (head, tail) = src.split_at(n);
    *src = tail;
    Ok(head)
}

/// Consume a 4-byte big-endian integer.
pub fn read_int(src: &mut &[u8]) -> Result<u32> {
    at_least(src, INT_SIZE)?;
    Ok(src.get_u32())
}

/// Consume a 4-byte big-endian length or count.
pub fn read_len(src: &mut &[u8]) -> Result<usize> {
    read_int(src).map(|len| len as usize)
}

/// Consume a length-prefixed segment and return its body.
pub fn read_segment<'a>(src: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = read_len(src)?;
    take(src, len)
}
