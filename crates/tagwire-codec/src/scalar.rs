//! Fixed-width scalar codecs. All numbers are big-endian.

use bytes::{BufMut, BytesMut};

use crate::codec::Codec;
use crate::error::{CodecError, Result};
use crate::factory::SerializableFactory;
use crate::utils::{int_to_bytes, put_len, read_segment};
use crate::value::{Complex, Value};

/// Read a length-prefixed payload that must be exactly `N` bytes.
fn fixed_payload<'a, const N: usize>(src: &'a [u8]) -> Result<([u8; N], &'a [u8])> {
    let mut rest = src;
    let payload = read_segment(&mut rest)?;
    if payload.len() < N {
        return Err(CodecError::Truncated {
            needed: N,
            remaining: payload.len(),
        });
    }
    if payload.len() > N {
        return Err(CodecError::TrailingBytes(payload.len() - N));
    }
    let mut raw = [0u8; N];
    raw.copy_from_slice(payload);
    Ok((raw, rest))
}

fn put_fixed(dst: &mut BytesMut, raw: &[u8]) -> Result<()> {
    dst.reserve(4 + raw.len());
    put_len(dst, raw.len())?;
    dst.put_slice(raw);
    Ok(())
}

/// Non-negative integers as 4 bytes, tag `int`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntCodec;

impl IntCodec {
    pub const TAG: &'static str = "int";
}

impl Codec for IntCodec {
    fn name(&self) -> &'static str {
        Self::TAG
    }

    fn encode(&self, value: &Value, _: &SerializableFactory, dst: &mut BytesMut) -> Result<()> {
        match value {
            Value::Int(v) => put_fixed(dst, &int_to_bytes(*v)?),
            other => Err(self.mismatch(other)),
        }
    }

    fn decode<'a>(&self, src: &'a [u8], _: &SerializableFactory) -> Result<(Value, &'a [u8])> {
        let (raw, rest) = fixed_payload::<4>(src)?;
        Ok((Value::Int(i64::from(u32::from_be_bytes(raw))), rest))
    }
}

/// Signed integers as 8 bytes (two's complement), tag `sint`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedIntCodec;

impl SignedIntCodec {
    pub const TAG: &'static str = "sint";
}

impl Codec for SignedIntCodec {
    fn name(&self) -> &'static str {
        Self::TAG
    }

    fn encode(&self, value: &Value, _: &SerializableFactory, dst: &mut BytesMut) -> Result<()> {
        match value {
            Value::SignedInt(v) => put_fixed(dst, &v.to_be_bytes()),
            other => Err(self.mismatch(other)),
        }
    }

    fn decode<'a>(&self, src: &'a [u8], _: &SerializableFactory) -> Result<(Value, &'a [u8])> {
        let (raw, rest) = fixed_payload::<8>(src)?;
        Ok((Value::SignedInt(i64::from_be_bytes(raw)), rest))
    }
}

/// IEEE-754 doubles, tag `float`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatCodec;

impl FloatCodec {
    pub const TAG: &'static str = "float";
}

impl Codec for FloatCodec {
    fn name(&self) -> &'static str {
        Self::TAG
    }

    fn encode(&self, value: &Value, _: &SerializableFactory, dst: &mut BytesMut) -> Result<()> {
        match value {
            Value::Float(v) => put_fixed(dst, &v.to_be_bytes()),
            other => Err(self.mismatch(other)),
        }
    }

    fn decode<'a>(&self, src: &'a [u8], _: &SerializableFactory) -> Result<(Value, &'a [u8])> {
        let (raw, rest) = fixed_payload::<8>(src)?;
        Ok((Value::Float(f64::from_be_bytes(raw)), rest))
    }
}

/// Real then imaginary part, two doubles, tag `complex`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexCodec;

impl ComplexCodec {
    pub const TAG: &'static str = "complex";
}

impl Codec for ComplexCodec {
    fn name(&self) -> &'static str {
        Self::TAG
    }

    fn encode(&self, value: &Value, _: &SerializableFactory, dst: &mut BytesMut) -> Result<()> {
        let c = match value {
            Value::Complex(c) => c,
            other => return Err(self.mismatch(other)),
        };
        let mut raw = [0u8; 16];
        raw[..8].copy_from_slice(&c.re.to_be_bytes());
        raw[8..].copy_from_slice(&c.im.to_be_bytes());
        put_fixed(dst, &raw)
    }

    fn decode<'a>(&self, src: &'a [u8], _: &SerializableFactory) -> Result<(Value, &'a [u8])> {
        let (raw, rest) = fixed_payload::<16>(src)?;
        let mut re = [0u8; 8];
        let mut im = [0u8; 8];
        re.copy_from_slice(&raw[..8]);
        im.copy_from_slice(&raw[8..]);
        let value = Complex::new(f64::from_be_bytes(re), f64::from_be_bytes(im));
        Ok((Value::Complex(value), rest))
    }
}

/// One byte, 0 or 1, tag `bool`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

impl BoolCodec {
    pub const TAG: &'static str = "bool";
}

impl Codec for BoolCodec {
    fn name(&self) -> &'static str {
        Self::TAG
    }

    fn encode(&self, value: &Value, _: &SerializableFactory, dst: &mut BytesMut) -> Result<()> {
        match value {
            Value::Bool(v) => put_fixed(dst, &[u8::from(*v)]),
            other => Err(self.mismatch(other)),
        }
    }

    fn decode<'a>(&self, src: &'a [u8], _: &SerializableFactory) -> Result<(Value, &'a [u8])> {
        let ([byte], rest) = fixed_payload::<1>(src)?;
        let value = match byte {
            0 => false,
            1 => true,
            other => {
                return Err(CodecError::InvalidData {
                    context: "bool",
                    message: format!("expected 0 or 1, found {other}"),
                })
            }
        };
        Ok((Value::Bool(value), rest))
    }
}
