//! Self-describing tagged binary encoding.
//!
//! Every value travels as an envelope: a length-prefixed ASCII tag naming its
//! codec, then a length-prefixed payload. A [`SerializableFactory`] maps each
//! [`ValueType`] to a tag and a [`Codec`], and dispatches on the tag when
//! decoding. Lists hold full envelopes for their elements, so mixed-type and
//! nested sequences decode without any outside schema.
//!
//! ```
//! use tagwire_codec::{SerializableFactory, Value};
//!
//! let factory = SerializableFactory::global();
//! let value = Value::from(vec![Value::from("hjk"), Value::Int(23), Value::Float(34.7)]);
//! let bytes = factory.serialize(&value).unwrap();
//! assert_eq!(factory.deserialize(&bytes).unwrap(), value);
//! ```
//!
//! All integers on the wire are big-endian.

pub mod array;
pub mod codec;
pub mod error;
pub mod factory;
pub mod list;
pub mod scalar;
pub mod string;
pub mod utils;
pub mod value;

pub use array::{ArrayData, DType, Element, NdArray, NdArrayCodec};
pub use codec::Codec;
pub use error::{CodecError, Result};
pub use factory::{Deserializer, SerializableFactory, Serializer, DEFAULT_MAX_DEPTH};
pub use list::ListCodec;
pub use scalar::{BoolCodec, ComplexCodec, FloatCodec, IntCodec, SignedIntCodec};
pub use string::{BytesCodec, StringCodec};
pub use value::{Complex, CustomValue, Value, ValueType};
