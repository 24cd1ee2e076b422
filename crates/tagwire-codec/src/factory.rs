//! Type registry mapping value types to tags and codecs.
//!
//! Envelope layout:
//! ```text
//! ┌──────────────┬──────────────┬────────────────┬────────────────────┐
//! │ TagLen (4B)  │ Tag (ASCII)  │ PayloadLen (4B)│ Payload            │
//! │ big-endian   │              │ big-endian     │ (PayloadLen bytes) │
//! └──────────────┴──────────────┴────────────────┴────────────────────┘
//! ```
//! The factory writes the tag segment; the codec writes the rest.

use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::array::NdArrayCodec;
use crate::codec::{Codec, TypedCodec};
use crate::error::{CodecError, Result};
use crate::list::ListCodec;
use crate::scalar::{BoolCodec, ComplexCodec, FloatCodec, IntCodec, SignedIntCodec};
use crate::string::{BytesCodec, StringCodec};
use crate::utils::{read_segment, write_segment};
use crate::value::{Value, ValueType};

struct Registration {
    tag: String,
    codec: Arc<dyn Codec>,
}

/// Default limit on how deeply envelopes may nest (a top-level scalar is 1).
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Registry of codecs keyed by exact value type and by wire tag.
///
/// Each type has at most one tag and each tag at most one type. Registering
/// again for either key replaces the previous binding and drops the stale
/// counterpart.
///
/// Container codecs recurse through the factory, so nesting is bounded by
/// [`max_depth`](Self::max_depth) in both directions. Deeper input fails with
/// [`CodecError::InvalidData`] instead of exhausting the stack.
pub struct SerializableFactory {
    by_type: HashMap<ValueType, Registration>,
    by_tag: HashMap<String, (ValueType, Arc<dyn Codec>)>,
    max_depth: usize,
}

impl Default for SerializableFactory {
    fn default() -> Self {
        Self {
            by_type: HashMap::new(),
            by_tag: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

static GLOBAL: OnceLock<SerializableFactory> = OnceLock::new();

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// One level of envelope nesting on the current thread, released on drop.
struct DepthGuard;

impl DepthGuard {
    fn enter(max_depth: usize) -> Result<Self> {
        DEPTH.with(|depth| {
            let current = depth.get();
            if current >= max_depth {
                return Err(CodecError::InvalidData {
                    context: "envelope",
                    message: format!("nesting exceeds {max_depth} levels"),
                });
            }
            depth.set(current + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

impl SerializableFactory {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in codec.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register_builtins();
        factory
    }

    /// The process-wide registry.
    ///
    /// Initialized with the built-ins on first use unless
    /// [`install_global`](Self::install_global) ran before.
    pub fn global() -> &'static SerializableFactory {
        GLOBAL.get_or_init(Self::with_builtins)
    }

    /// Replace the process-wide registry before its first use.
    ///
    /// Returns the factory back if the global registry is already set.
    pub fn install_global(factory: SerializableFactory) -> std::result::Result<(), Self> {
        GLOBAL.set(factory)
    }

    /// Set the nesting limit for encoding and decoding.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn register_builtins(&mut self) {
        let builtins: [(ValueType, &str, Arc<dyn Codec>); 9] = [
            (ValueType::Str, StringCodec::TAG, Arc::new(StringCodec)),
            (ValueType::Bytes, BytesCodec::TAG, Arc::new(BytesCodec)),
            (ValueType::Int, IntCodec::TAG, Arc::new(IntCodec)),
            (ValueType::SignedInt, SignedIntCodec::TAG, Arc::new(SignedIntCodec)),
            (ValueType::Float, FloatCodec::TAG, Arc::new(FloatCodec)),
            (ValueType::Complex, ComplexCodec::TAG, Arc::new(ComplexCodec)),
            (ValueType::Bool, BoolCodec::TAG, Arc::new(BoolCodec)),
            (ValueType::NdArray, NdArrayCodec::TAG, Arc::new(NdArrayCodec)),
            (ValueType::List, ListCodec::TAG, Arc::new(ListCodec)),
        ];
        for (value_type, tag, codec) in builtins {
            self.insert(value_type, tag.to_string(), codec);
        }
    }

    /// Bind `value_type` to `tag` and `codec`.
    ///
    /// Tags must be non-empty ASCII.
    pub fn register<C>(&mut self, value_type: ValueType, tag: &str, codec: C) -> Result<()>
    where
        C: Codec + 'static,
    {
        validate_tag(tag)?;
        self.insert(value_type, tag.to_string(), Arc::new(codec));
        Ok(())
    }

    /// Register an application type carried as [`Value::Custom`].
    ///
    /// `encode` and `decode` deal with the payload only.
    pub fn register_codec<T, E, D>(&mut self, tag: &str, encode: E, decode: D) -> Result<()>
    where
        T: Any + Send + Sync + PartialEq + fmt::Debug,
        E: Fn(&T) -> Result<Vec<u8>> + Send + Sync + 'static,
        D: Fn(&[u8]) -> Result<T> + Send + Sync + 'static,
    {
        let codec = TypedCodec::<T, E, D>::new(std::any::type_name::<T>(), encode, decode);
        self.register(ValueType::of::<T>(), tag, codec)
    }

    fn insert(&mut self, value_type: ValueType, tag: String, codec: Arc<dyn Codec>) {
        if let Some(old) = self.by_type.remove(&value_type) {
            if old.tag != tag {
                debug!(old_tag = %old.tag, new_tag = %tag, "re-registering type under new tag");
                self.by_tag.remove(&old.tag);
            }
        }
        if let Some((old_type, _)) = self.by_tag.remove(&tag) {
            if old_type != value_type {
                debug!(%tag, old_type = old_type.name(), "tag rebound to another type");
                self.by_type.remove(&old_type);
            }
        }

        self.by_tag.insert(tag.clone(), (value_type, Arc::clone(&codec)));
        self.by_type.insert(value_type, Registration { tag, codec });
    }

    /// Encode `value` as a full envelope.
    pub fn serialize(&self, value: &Value) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.serialize_into(value, &mut dst)?;
        Ok(dst.freeze())
    }

    /// Append the envelope for `value` to `dst`.
    pub fn serialize_into(&self, value: &Value, dst: &mut BytesMut) -> Result<()> {
        let registration = self
            .by_type
            .get(&value.value_type())
            .ok_or_else(|| CodecError::UnregisteredType(value.type_name()))?;
        write_envelope(self, &registration.tag, registration.codec.as_ref(), value, dst)
    }

    /// Decode one envelope and discard whatever follows it.
    pub fn deserialize(&self, src: &[u8]) -> Result<Value> {
        self.deserialize_envelope(src).map(|(value, _)| value)
    }

    /// Decode one envelope from the front of `src` and return the remainder.
    pub fn deserialize_envelope<'a>(&self, src: &'a [u8]) -> Result<(Value, &'a [u8])> {
        let _depth = DepthGuard::enter(self.max_depth)?;
        let mut rest = src;
        let tag = std::str::from_utf8(read_segment(&mut rest)?)?;
        let (_, codec) = self
            .by_tag
            .get(tag)
            .ok_or_else(|| CodecError::UnknownTag(tag.to_string()))?;
        codec.decode(rest, self)
    }

    /// Envelope-producing handle for `value_type`.
    pub fn get_serializer(&self, value_type: ValueType) -> Option<Serializer<'_>> {
        self.by_type.get(&value_type).map(|registration| Serializer {
            tag: &registration.tag,
            codec: registration.codec.as_ref(),
            factory: self,
        })
    }

    /// Payload decoder for `tag`; the input starts after the tag segment.
    pub fn get_deserializer_for_tag(&self, tag: &str) -> Option<Deserializer<'_>> {
        self.by_tag.get(tag).map(|(value_type, codec)| Deserializer {
            value_type: *value_type,
            codec: codec.as_ref(),
            factory: self,
        })
    }

    /// The tag bound to `value_type`.
    pub fn tag_for(&self, value_type: ValueType) -> Option<&str> {
        self.by_type.get(&value_type).map(|r| r.tag.as_str())
    }

    /// All registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.by_tag.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn is_registered(&self, value_type: ValueType) -> bool {
        self.by_type.contains_key(&value_type)
    }
}

impl fmt::Debug for SerializableFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializableFactory")
            .field("tags", &self.tags())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() || !tag.is_ascii() {
        return Err(CodecError::InvalidTag(tag.to_string()));
    }
    Ok(())
}

fn write_envelope(
    factory: &SerializableFactory,
    tag: &str,
    codec: &dyn Codec,
    value: &Value,
    dst: &mut BytesMut,
) -> Result<()> {
    let _depth = DepthGuard::enter(factory.max_depth)?;
    write_segment(dst, tag.as_bytes())?;
    codec.encode(value, factory, dst)
}

/// Serializer bound to one registered type.
#[derive(Clone, Copy)]
pub struct Serializer<'f> {
    tag: &'f str,
    codec: &'f dyn Codec,
    factory: &'f SerializableFactory,
}

impl Serializer<'_> {
    pub fn tag(&self) -> &str {
        self.tag
    }

    /// Full envelope for `value`.
    pub fn serialize(&self, value: &Value) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        write_envelope(self.factory, self.tag, self.codec, value, &mut dst)?;
        Ok(dst.freeze())
    }
}

impl fmt::Debug for Serializer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("tag", &self.tag)
            .field("codec", &self.codec.name())
            .finish()
    }
}

/// Deserializer bound to one registered tag.
#[derive(Clone, Copy)]
pub struct Deserializer<'f> {
    value_type: ValueType,
    codec: &'f dyn Codec,
    factory: &'f SerializableFactory,
}

impl Deserializer<'_> {
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Decode `PayloadLen ++ Payload` and return the remainder.
    pub fn deserialize<'a>(&self, src: &'a [u8]) -> Result<(Value, &'a [u8])> {
        let _depth = DepthGuard::enter(self.factory.max_depth)?;
        self.codec.decode(src, self.factory)
    }
}

impl fmt::Debug for Deserializer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deserializer")
            .field("value_type", &self.value_type)
            .field("codec", &self.codec.name())
            .finish()
    }
}
