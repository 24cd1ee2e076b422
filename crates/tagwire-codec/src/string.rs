use bytes::{Bytes, BytesMut};

use crate::codec::Codec;
use crate::error::Result;
use crate::factory::SerializableFactory;
use crate::utils::{bytes_to_string, read_segment, write_segment};
use crate::value::Value;

/// UTF-8 text, tag `str`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl StringCodec {
    pub const TAG: &'static str = "str";
}

impl Codec for StringCodec {
    fn name(&self) -> &'static str {
        Self::TAG
    }

    fn encode(&self, value: &Value, _: &SerializableFactory, dst: &mut BytesMut) -> Result<()> {
        match value {
            Value::Str(text) => write_segment(dst, text.as_bytes()),
            other => Err(self.mismatch(other)),
        }
    }

    fn decode<'a>(&self, src: &'a [u8], _: &SerializableFactory) -> Result<(Value, &'a [u8])> {
        let mut rest = src;
        let text = bytes_to_string(read_segment(&mut rest)?)?;
        Ok((Value::Str(text), rest))
    }
}

/// Raw bytes, passed through unchanged, tag `bytes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl BytesCodec {
    pub const TAG: &'static str = "bytes";
}

impl Codec for BytesCodec {
    fn name(&self) -> &'static str {
        Self::TAG
    }

    fn encode(&self, value: &Value, _: &SerializableFactory, dst: &mut BytesMut) -> Result<()> {
        match value {
            Value::Bytes(data) => write_segment(dst, data),
            other => Err(self.mismatch(other)),
        }
    }

    fn decode<'a>(&self, src: &'a [u8], _: &SerializableFactory) -> Result<(Value, &'a [u8])> {
        let mut rest = src;
        let data = Bytes::copy_from_slice(read_segment(&mut rest)?);
        Ok((Value::Bytes(data), rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn string_is_length_prefixed_utf8() {
        let factory = SerializableFactory::new();
        let encoded = StringCodec.serialize(&Value::from("ert"), &factory).unwrap();
        assert_eq!(encoded.as_ref(), b"\x00\x00\x00\x03ert");

        let (value, rest) = StringCodec.decode(&encoded, &factory).unwrap();
        assert_eq!(value, Value::from("ert"));
        assert!(rest.is_empty());
    }

    #[test]
    fn string_length_counts_bytes_not_chars() {
        let factory = SerializableFactory::new();
        let encoded = StringCodec.serialize(&Value::from("né"), &factory).unwrap();
        assert_eq!(&encoded[..4], [0, 0, 0, 3]);
        assert_eq!(
            StringCodec.decode(&encoded, &factory).unwrap().0,
            Value::from("né")
        );
    }

    #[test]
    fn empty_string() {
        let factory = SerializableFactory::new();
        let encoded = StringCodec.serialize(&Value::from(""), &factory).unwrap();
        assert_eq!(encoded.as_ref(), [0, 0, 0, 0]);
        assert_eq!(StringCodec.decode(&encoded, &factory).unwrap().0, Value::from(""));
    }

    #[test]
    fn string_rejects_other_types() {
        let err = StringCodec
            .serialize(&Value::Int(3), &SerializableFactory::new())
            .unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { codec: "str", .. }));
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        let err = StringCodec
            .decode(&[0, 0, 0, 2, 0xc3, 0x28], &SerializableFactory::new())
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8(_)));
    }

    #[test]
    fn bytes_pass_through() {
        let factory = SerializableFactory::new();
        let data = Value::from(vec![0u8, 255, 10, 13]);
        let encoded = BytesCodec.serialize(&data, &factory).unwrap();
        assert_eq!(encoded.as_ref(), [0, 0, 0, 4, 0, 255, 10, 13]);
        assert_eq!(BytesCodec.decode(&encoded, &factory).unwrap().0, data);
    }

    #[test]
    fn truncated_payload() {
        let err = BytesCodec
            .decode(&[0, 0, 0, 5, 1, 2], &SerializableFactory::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::Truncated {
                needed: 5,
                remaining: 2
            }
        ));
    }
}
