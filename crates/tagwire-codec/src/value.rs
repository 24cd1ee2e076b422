use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::array::NdArray;

/// A complex number stored as two consecutive floats.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub const fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

/// A runtime value that can travel over the wire.
///
/// Each variant maps to exactly one [`ValueType`], which is what the
/// factory uses to pick a codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bytes(Bytes),
    /// Non-negative integer (lengths, counts, indices).
    Int(i64),
    /// Signed 64-bit integer.
    SignedInt(i64),
    Float(f64),
    Complex(Complex<f64>),
    Bool(bool),
    NdArray(NdArray),
    /// Ordered, possibly heterogeneous sequence.
    List(Vec<Value>),
    /// Application type registered with
    /// [`register_codec`](crate::SerializableFactory::register_codec).
    Custom(CustomValue),
}

/// Stable identifier of a value's exact runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Str,
    Bytes,
    Int,
    SignedInt,
    Float,
    Complex,
    Bool,
    NdArray,
    List,
    Custom(TypeId),
}

impl ValueType {
    /// The type key for a custom application type.
    pub fn of<T: Any>() -> Self {
        Self::Custom(TypeId::of::<T>())
    }

    /// Human-readable name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::Int => "int",
            Self::SignedInt => "signed int",
            Self::Float => "float",
            Self::Complex => "complex",
            Self::Bool => "bool",
            Self::NdArray => "ndarray",
            Self::List => "list",
            Self::Custom(_) => "custom",
        }
    }
}

impl Value {
    /// Wrap an application value.
    pub fn custom<T>(value: T) -> Self
    where
        T: Any + Send + Sync + PartialEq + fmt::Debug,
    {
        Self::Custom(CustomValue::new(value))
    }

    /// The registry key of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Str(_) => ValueType::Str,
            Self::Bytes(_) => ValueType::Bytes,
            Self::Int(_) => ValueType::Int,
            Self::SignedInt(_) => ValueType::SignedInt,
            Self::Float(_) => ValueType::Float,
            Self::Complex(_) => ValueType::Complex,
            Self::Bool(_) => ValueType::Bool,
            Self::NdArray(_) => ValueType::NdArray,
            Self::List(_) => ValueType::List,
            Self::Custom(custom) => ValueType::Custom(custom.type_id()),
        }
    }

    /// Name of the runtime type, including the Rust type name for custom values.
    pub fn type_name(&self) -> String {
        match self {
            Self::Custom(custom) => custom.type_name().to_string(),
            other => other.value_type().name().to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The integer held by `Int` or `SignedInt`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) | Self::SignedInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Self::NdArray(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the application value if this is a `Custom` of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(custom) => custom.downcast_ref(),
            _ => None,
        }
    }

    /// Equality that compares floats, complex numbers and arrays within
    /// numerical tolerance, recursing into lists.
    pub fn approx_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => close(*a, *b),
            (Self::Complex(a), Self::Complex(b)) => close(a.re, b.re) && close(a.im, b.im),
            (Self::NdArray(a), Self::NdArray(b)) => a.all_close(b),
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.approx_eq(y))
            }
            (a, b) => a == b,
        }
    }
}

pub(crate) const RTOL: f64 = 1e-5;
pub(crate) const ATOL: f64 = 1e-8;

pub(crate) fn close(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= ATOL + RTOL * b.abs()
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::SignedInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Complex<f64>> for Value {
    fn from(value: Complex<f64>) -> Self {
        Self::Complex(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NdArray> for Value {
    fn from(value: NdArray) -> Self {
        Self::NdArray(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

type AnyValue = dyn Any + Send + Sync;

/// A type-erased application value.
///
/// Equality and `Debug` are forwarded to the wrapped type.
#[derive(Clone)]
pub struct CustomValue {
    inner: Arc<AnyValue>,
    type_id: TypeId,
    type_name: &'static str,
    eq: fn(&AnyValue, &AnyValue) -> bool,
    fmt: fn(&AnyValue, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl CustomValue {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + PartialEq + fmt::Debug,
    {
        Self {
            inner: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            eq: eq_as::<T>,
            fmt: fmt_as::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

fn eq_as<T: Any + PartialEq>(a: &AnyValue, b: &AnyValue) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn fmt_as<T: Any + fmt::Debug>(value: &AnyValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(value) => fmt::Debug::fmt(value, f),
        None => f.write_str("<custom>"),
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && (self.eq)(&*self.inner, &*other.inner)
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.fmt)(&*self.inner, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn value_type_matches_variant() {
        assert_eq!(Value::from("a").value_type(), ValueType::Str);
        assert_eq!(Value::from(3u32).value_type(), ValueType::Int);
        assert_eq!(Value::from(-3i64).value_type(), ValueType::SignedInt);
        assert_eq!(Value::from(1.5).value_type(), ValueType::Float);
        assert_eq!(Value::from(true).value_type(), ValueType::Bool);
        assert_eq!(Value::from(vec![1u8, 2]).value_type(), ValueType::Bytes);
        assert_eq!(Value::from(Vec::<Value>::new()).value_type(), ValueType::List);
    }

    #[test]
    fn custom_value_equality_and_downcast() {
        let a = Value::custom(Point { x: 1, y: 2 });
        let b = Value::custom(Point { x: 1, y: 2 });
        let c = Value::custom(Point { x: 3, y: 2 });

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.value_type(), ValueType::of::<Point>());
        assert_eq!(a.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
        assert!(a.downcast_ref::<String>().is_none());
        assert!(a.type_name().ends_with("Point"));
        assert_eq!(format!("{a:?}"), "Custom(Point { x: 1, y: 2 })");
    }

    #[test]
    fn custom_values_of_different_types_differ() {
        assert_ne!(Value::custom(1u8), Value::custom(1u16));
    }

    #[test]
    fn approx_eq_tolerates_float_noise() {
        assert!(Value::from(0.1 + 0.2).approx_eq(&Value::from(0.3)));
        assert!(!Value::from(0.1).approx_eq(&Value::from(0.2)));
        let list = Value::from(vec![Value::from("x"), Value::from(1.0)]);
        let noisy = Value::from(vec![Value::from("x"), Value::from(1.0 + 1e-12)]);
        assert!(list.approx_eq(&noisy));
    }
}
