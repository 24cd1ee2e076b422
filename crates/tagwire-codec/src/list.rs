//! Heterogeneous lists.
//!
//! Payload: `count (4B BE)` followed by one full envelope per element, so
//! every element carries its own tag and may itself be a list.

use bytes::BytesMut;

use crate::codec::Codec;
use crate::error::{CodecError, Result};
use crate::factory::SerializableFactory;
use crate::utils::{len_to_bytes, put_len, read_len, read_segment, INT_SIZE};
use crate::value::Value;

/// Smallest possible element envelope: empty tag length plus payload length.
const MIN_ELEMENT_SIZE: usize = 2 * INT_SIZE;

/// Ordered sequences of arbitrary registered values, tag `list`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCodec;

impl ListCodec {
    pub const TAG: &'static str = "list";
}

impl Codec for ListCodec {
    fn name(&self) -> &'static str {
        Self::TAG
    }

    fn encode(
        &self,
        value: &Value,
        factory: &SerializableFactory,
        dst: &mut BytesMut,
    ) -> Result<()> {
        let items = match value {
            Value::List(items) => items,
            other => return Err(self.mismatch(other)),
        };

        // Payload length is patched once the elements are written.
        let len_at = dst.len();
        put_len(dst, 0)?;
        let payload_at = dst.len();
        put_len(dst, items.len())?;
        for item in items {
            factory.serialize_into(item, dst)?;
        }

        let payload_len = len_to_bytes(dst.len() - payload_at)?;
        dst[len_at..payload_at].copy_from_slice(&payload_len);
        Ok(())
    }

    fn decode<'a>(
        &self,
        src: &'a [u8],
        factory: &SerializableFactory,
    ) -> Result<(Value, &'a [u8])> {
        let mut rest = src;
        let mut payload = read_segment(&mut rest)?;

        let count = read_len(&mut payload)?;
        let mut items = Vec::with_capacity(count.min(payload.len() / MIN_ELEMENT_SIZE));
        for _ in 0..count {
            let (item, tail) = factory.deserialize_envelope(payload)?;
            items.push(item);
            payload = tail;
        }
        if !payload.is_empty() {
            return Err(CodecError::TrailingBytes(payload.len()));
        }

        Ok((Value::List(items), rest))
    }
}
