use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use bytes::{Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::factory::SerializableFactory;
use crate::utils::{read_segment, write_segment};
use crate::value::Value;

/// A pair of encode/decode functions for one value type.
///
/// `encode` appends `PayloadLen (4B BE) ++ Payload` to `dst`; the factory
/// writes the tag segment in front of it. `decode` consumes exactly that
/// region from the front of `src` and returns the unconsumed remainder.
///
/// The factory is passed through so that container codecs can encode and
/// decode their elements via the registry.
pub trait Codec: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &'static str;

    fn encode(&self, value: &Value, factory: &SerializableFactory, dst: &mut BytesMut)
        -> Result<()>;

    fn decode<'a>(&self, src: &'a [u8], factory: &SerializableFactory)
        -> Result<(Value, &'a [u8])>;

    /// Encode into a fresh buffer.
    fn serialize(&self, value: &Value, factory: &SerializableFactory) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode(value, factory, &mut dst)?;
        Ok(dst.freeze())
    }

    /// The error for a value this codec does not accept.
    fn mismatch(&self, value: &Value) -> CodecError {
        CodecError::TypeMismatch {
            codec: self.name(),
            found: value.type_name(),
        }
    }
}

/// Codec for an application type built from two payload functions.
///
/// The functions see only the payload; length framing and wrapping into
/// [`Value::Custom`] happen here.
pub(crate) struct TypedCodec<T, E, D> {
    name: &'static str,
    encode: E,
    decode: D,
    _marker: PhantomData<fn() -> T>,
}

impl<T, E, D> TypedCodec<T, E, D> {
    pub(crate) fn new(name: &'static str, encode: E, decode: D) -> Self {
        Self {
            name,
            encode,
            decode,
            _marker: PhantomData,
        }
    }
}

impl<T, E, D> Codec for TypedCodec<T, E, D>
where
    T: Any + Send + Sync + PartialEq + fmt::Debug,
    E: Fn(&T) -> Result<Vec<u8>> + Send + Sync,
    D: Fn(&[u8]) -> Result<T> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn encode(&self, value: &Value, _: &SerializableFactory, dst: &mut BytesMut) -> Result<()> {
        let typed = value.downcast_ref::<T>().ok_or_else(|| self.mismatch(value))?;
        let payload = (self.encode)(typed)?;
        write_segment(dst, &payload)
    }

    fn decode<'a>(&self, src: &'a [u8], _: &SerializableFactory) -> Result<(Value, &'a [u8])> {
        let mut rest = src;
        let payload = read_segment(&mut rest)?;
        let typed = (self.decode)(payload)?;
        Ok((Value::custom(typed), rest))
    }
}
