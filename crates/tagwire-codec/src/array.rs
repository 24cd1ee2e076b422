//! N-dimensional numeric arrays and their codec.
//!
//! Wire layout of the payload (inside the usual 4-byte payload length):
//! ```text
//! ┌────────────┬──────────────────┬─────────────┬─────────────┬───────────────────────┐
//! │ ndim (4B)  │ dims (ndim × 4B) │ dtype len   │ dtype ASCII │ raw buffer            │
//! │            │                  │ (4B)        │             │ (elements, BE)        │
//! └────────────┴──────────────────┴─────────────┴─────────────┴───────────────────────┘
//! ```
//! The raw buffer must hold exactly `product(shape) × itemsize` bytes.

use bytes::{BufMut, BytesMut};

use crate::codec::Codec;
use crate::error::{CodecError, Result};
use crate::factory::SerializableFactory;
use crate::utils::{put_len, read_len, read_segment, write_segment, INT_SIZE};
use crate::value::{Complex, Value, ATOL, RTOL};

/// Element type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl DType {
    pub const ALL: [DType; 13] = [
        DType::Bool,
        DType::Int8,
        DType::Int16,
        DType::Int32,
        DType::Int64,
        DType::UInt8,
        DType::UInt16,
        DType::UInt32,
        DType::UInt64,
        DType::Float32,
        DType::Float64,
        DType::Complex64,
        DType::Complex128,
    ];

    /// Wire name of the element type.
    pub fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Complex64 => "complex64",
            DType::Complex128 => "complex128",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dtype| dtype.name() == name)
    }

    /// Size of one element in bytes.
    pub fn itemsize(&self) -> usize {
        match self {
            DType::Bool | DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 | DType::Complex64 => 8,
            DType::Complex128 => 16,
        }
    }
}

/// Contiguous, row-major element buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex64(Vec<Complex<f32>>),
    Complex128(Vec<Complex<f64>>),
}

impl ArrayData {
    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Bool(_) => DType::Bool,
            ArrayData::Int8(_) => DType::Int8,
            ArrayData::Int16(_) => DType::Int16,
            ArrayData::Int32(_) => DType::Int32,
            ArrayData::Int64(_) => DType::Int64,
            ArrayData::UInt8(_) => DType::UInt8,
            ArrayData::UInt16(_) => DType::UInt16,
            ArrayData::UInt32(_) => DType::UInt32,
            ArrayData::UInt64(_) => DType::UInt64,
            ArrayData::Float32(_) => DType::Float32,
            ArrayData::Float64(_) => DType::Float64,
            ArrayData::Complex64(_) => DType::Complex64,
            ArrayData::Complex128(_) => DType::Complex128,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bool(v) => v.len(),
            ArrayData::Int8(v) => v.len(),
            ArrayData::Int16(v) => v.len(),
            ArrayData::Int32(v) => v.len(),
            ArrayData::Int64(v) => v.len(),
            ArrayData::UInt8(v) => v.len(),
            ArrayData::UInt16(v) => v.len(),
            ArrayData::UInt32(v) => v.len(),
            ArrayData::UInt64(v) => v.len(),
            ArrayData::Float32(v) => v.len(),
            ArrayData::Float64(v) => v.len(),
            ArrayData::Complex64(v) => v.len(),
            ArrayData::Complex128(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the raw buffer in bytes.
    pub fn nbytes(&self) -> usize {
        self.len() * self.dtype().itemsize()
    }

    fn write_be(&self, dst: &mut BytesMut) {
        dst.reserve(self.nbytes());
        match self {
            ArrayData::Bool(v) => v.iter().for_each(|&x| dst.put_u8(u8::from(x))),
            ArrayData::Int8(v) => v.iter().for_each(|&x| dst.put_i8(x)),
            ArrayData::Int16(v) => v.iter().for_each(|&x| dst.put_i16(x)),
            ArrayData::Int32(v) => v.iter().for_each(|&x| dst.put_i32(x)),
            ArrayData::Int64(v) => v.iter().for_each(|&x| dst.put_i64(x)),
            ArrayData::UInt8(v) => dst.put_slice(v),
            ArrayData::UInt16(v) => v.iter().for_each(|&x| dst.put_u16(x)),
            ArrayData::UInt32(v) => v.iter().for_each(|&x| dst.put_u32(x)),
            ArrayData::UInt64(v) => v.iter().for_each(|&x| dst.put_u64(x)),
            ArrayData::Float32(v) => v.iter().for_each(|&x| dst.put_f32(x)),
            ArrayData::Float64(v) => v.iter().for_each(|&x| dst.put_f64(x)),
            ArrayData::Complex64(v) => v.iter().for_each(|c| {
                dst.put_f32(c.re);
                dst.put_f32(c.im);
            }),
            ArrayData::Complex128(v) => v.iter().for_each(|c| {
                dst.put_f64(c.re);
                dst.put_f64(c.im);
            }),
        }
    }

    /// Reinterpret a big-endian buffer whose length is a multiple of the
    /// dtype's item size.
    fn read_be(dtype: DType, raw: &[u8]) -> Result<Self> {
        Ok(match dtype {
            DType::Bool => ArrayData::Bool(
                raw.iter()
                    .map(|&b| match b {
                        0 => Ok(false),
                        1 => Ok(true),
                        other => Err(CodecError::InvalidData {
                            context: "ndarray",
                            message: format!("invalid bool element {other}"),
                        }),
                    })
                    .collect::<Result<_>>()?,
            ),
            DType::Int8 => ArrayData::Int8(from_be(raw, i8::from_be_bytes)),
            DType::Int16 => ArrayData::Int16(from_be(raw, i16::from_be_bytes)),
            DType::Int32 => ArrayData::Int32(from_be(raw, i32::from_be_bytes)),
            DType::Int64 => ArrayData::Int64(from_be(raw, i64::from_be_bytes)),
            DType::UInt8 => ArrayData::UInt8(raw.to_vec()),
            DType::UInt16 => ArrayData::UInt16(from_be(raw, u16::from_be_bytes)),
            DType::UInt32 => ArrayData::UInt32(from_be(raw, u32::from_be_bytes)),
            DType::UInt64 => ArrayData::UInt64(from_be(raw, u64::from_be_bytes)),
            DType::Float32 => ArrayData::Float32(from_be(raw, f32::from_be_bytes)),
            DType::Float64 => ArrayData::Float64(from_be(raw, f64::from_be_bytes)),
            DType::Complex64 => ArrayData::Complex64(
                from_be(raw, f32::from_be_bytes)
                    .chunks_exact(2)
                    .map(|pair| Complex::new(pair[0], pair[1]))
                    .collect(),
            ),
            DType::Complex128 => ArrayData::Complex128(
                from_be(raw, f64::from_be_bytes)
                    .chunks_exact(2)
                    .map(|pair| Complex::new(pair[0], pair[1]))
                    .collect(),
            ),
        })
    }

    /// Every element widened to a complex double, for tolerance comparisons.
    fn to_complex128(&self) -> Vec<Complex<f64>> {
        fn real<T: Copy + Into<f64>>(v: &[T]) -> Vec<Complex<f64>> {
            v.iter().map(|&x| Complex::new(x.into(), 0.0)).collect()
        }
        match self {
            ArrayData::Bool(v) => v
                .iter()
                .map(|&b| Complex::new(if b { 1.0 } else { 0.0 }, 0.0))
                .collect(),
            ArrayData::Int8(v) => real(v),
            ArrayData::Int16(v) => real(v),
            ArrayData::Int32(v) => real(v),
            ArrayData::Int64(v) => v.iter().map(|&x| Complex::new(x as f64, 0.0)).collect(),
            ArrayData::UInt8(v) => real(v),
            ArrayData::UInt16(v) => real(v),
            ArrayData::UInt32(v) => real(v),
            ArrayData::UInt64(v) => v.iter().map(|&x| Complex::new(x as f64, 0.0)).collect(),
            ArrayData::Float32(v) => real(v),
            ArrayData::Float64(v) => real(v),
            ArrayData::Complex64(v) => v
                .iter()
                .map(|c| Complex::new(f64::from(c.re), f64::from(c.im)))
                .collect(),
            ArrayData::Complex128(v) => v.clone(),
        }
    }
}

fn from_be<T, const N: usize>(raw: &[u8], convert: fn([u8; N]) -> T) -> Vec<T> {
    raw.chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            convert(bytes)
        })
        .collect()
}

/// Rust element types that map onto a [`DType`].
pub trait Element: Copy {
    const DTYPE: DType;
    fn into_data(values: Vec<Self>) -> ArrayData;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$variant;
                fn into_data(values: Vec<Self>) -> ArrayData {
                    ArrayData::$variant(values)
                }
            }
        )*
    };
}

impl_element!(
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    Complex<f32> => Complex64,
    Complex<f64> => Complex128,
);

/// An N-dimensional array: shape, element type and a row-major buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    /// Build an array, checking that `product(shape)` matches the buffer.
    ///
    /// An empty shape is a 0-dimensional array holding one element.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected = element_count(&shape)?;
        if expected != data.len() {
            return Err(CodecError::ShapeMismatch {
                shape,
                expected,
                found: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// One-dimensional array from a vector.
    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        Self {
            shape: vec![values.len()],
            data: T::into_data(values),
        }
    }

    /// 0-dimensional array holding a single element.
    pub fn scalar<T: Element>(value: T) -> Self {
        Self {
            shape: Vec::new(),
            data: T::into_data(vec![value]),
        }
    }

    /// Same buffer, new shape.
    pub fn reshape(self, shape: Vec<usize>) -> Result<Self> {
        Self::new(shape, self.data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element-wise closeness with `rtol = 1e-5`, `atol = 1e-8`.
    ///
    /// Shapes must match; element types may differ.
    pub fn all_close(&self, other: &NdArray) -> bool {
        if self.shape != other.shape {
            return false;
        }
        let a = self.data.to_complex128();
        let b = other.data.to_complex128();
        a.len() == b.len()
            && a.iter().zip(&b).all(|(x, y)| {
                if x == y {
                    return true;
                }
                let diff = (x.re - y.re).hypot(x.im - y.im);
                diff <= ATOL + RTOL * y.re.hypot(y.im)
            })
    }
}

impl<T: Element> From<Vec<T>> for NdArray {
    fn from(values: Vec<T>) -> Self {
        Self::from_vec(values)
    }
}

fn element_count(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| CodecError::InvalidData {
            context: "ndarray",
            message: format!("shape {shape:?} overflows"),
        })
}

/// Codec for [`Value::NdArray`] under the `ndarray` tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdArrayCodec;

impl NdArrayCodec {
    pub const TAG: &'static str = "ndarray";
}

impl Codec for NdArrayCodec {
    fn name(&self) -> &'static str {
        Self::TAG
    }

    fn encode(&self, value: &Value, _: &SerializableFactory, dst: &mut BytesMut) -> Result<()> {
        let array = match value {
            Value::NdArray(array) => array,
            other => return Err(self.mismatch(other)),
        };

        let dtype = array.dtype().name();
        let payload_len = INT_SIZE
            + INT_SIZE * array.ndim()
            + INT_SIZE
            + dtype.len()
            + array.data.nbytes();

        dst.reserve(INT_SIZE + payload_len);
        put_len(dst, payload_len)?;
        put_len(dst, array.ndim())?;
        for &dim in &array.shape {
            put_len(dst, dim)?;
        }
        write_segment(dst, dtype.as_bytes())?;
        array.data.write_be(dst);
        Ok(())
    }

    fn decode<'a>(&self, src: &'a [u8], _: &SerializableFactory) -> Result<(Value, &'a [u8])> {
        let mut rest = src;
        let mut payload = read_segment(&mut rest)?;

        let ndim = read_len(&mut payload)?;
        let shape_bytes = ndim.checked_mul(INT_SIZE).unwrap_or(usize::MAX);
        crate::utils::at_least(payload, shape_bytes)?;
        let shape = (0..ndim)
            .map(|_| read_len(&mut payload))
            .collect::<Result<Vec<_>>>()?;

        let dtype_name = std::str::from_utf8(read_segment(&mut payload)?)?;
        let dtype = DType::from_name(dtype_name).ok_or_else(|| CodecError::InvalidData {
            context: "ndarray",
            message: format!("unknown dtype {dtype_name:?}"),
        })?;

        let count = element_count(&shape)?;
        let nbytes = count
            .checked_mul(dtype.itemsize())
            .ok_or_else(|| CodecError::InvalidData {
                context: "ndarray",
                message: format!("buffer size of shape {shape:?} overflows"),
            })?;
        if payload.len() < nbytes {
            return Err(CodecError::Truncated {
                needed: nbytes,
                remaining: payload.len(),
            });
        }
        if payload.len() > nbytes {
            return Err(CodecError::TrailingBytes(payload.len() - nbytes));
        }

        let data = ArrayData::read_be(dtype, payload)?;
        Ok((Value::NdArray(NdArray { shape, data }), rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(array: NdArray) -> NdArray {
        let factory = SerializableFactory::new();
        let encoded = NdArrayCodec
            .serialize(&Value::NdArray(array), &factory)
            .unwrap();
        let (value, rest) = NdArrayCodec.decode(&encoded, &factory).unwrap();
        assert!(rest.is_empty());
        match value {
            Value::NdArray(array) => array,
            other => panic!("expected ndarray, got {other:?}"),
        }
    }

    fn arange(n: usize) -> Vec<i64> {
        (0..n as i64).collect()
    }

    #[test]
    fn roundtrips_all_dimensionalities() {
        let zero_d = NdArray::scalar(2.7f64);
        let one_d = NdArray::from(arange(10));
        let two_d = NdArray::from(arange(30)).reshape(vec![5, 6]).unwrap();
        let n_d = NdArray::from(arange(90)).reshape(vec![5, 6, 3]).unwrap();

        for array in [zero_d, one_d, two_d, n_d] {
            let back = roundtrip(array.clone());
            assert_eq!(back.shape(), array.shape());
            assert!(back.all_close(&array));
            assert_eq!(back, array);
        }
    }

    #[test]
    fn roundtrips_element_types() {
        let arrays = [
            NdArray::from(vec![12i64, 56, 78]),
            NdArray::from(vec![-12.8f64, 56.0, 78.0]),
            NdArray::from(vec![12i64]),
            NdArray::from(vec![true, false]),
            NdArray::from(vec![
                Complex::new(12.0, 6.0),
                Complex::new(56.0, 0.0),
                Complex::new(78.0, 0.0),
                Complex::new(12.0, 0.0),
                Complex::new(56.0, 0.0),
                Complex::new(78.0, 0.0),
                Complex::new(12.0, 0.0),
                Complex::new(56.0, 0.0),
                Complex::new(78.0, 0.0),
            ])
            .reshape(vec![3, 3])
            .unwrap(),
            NdArray::from(vec![1.5f32, -2.25]),
            NdArray::from(vec![Complex::new(1.0f32, -1.0)]),
            NdArray::from(vec![i8::MIN, i8::MAX]),
            NdArray::from(vec![u16::MAX, 0]),
            NdArray::from(vec![u64::MAX]),
            NdArray::from(vec![0u8, 255]),
        ];

        for array in arrays {
            assert_eq!(roundtrip(array.clone()), array);
        }
    }

    #[test]
    fn payload_layout_is_shape_dtype_buffer() {
        let factory = SerializableFactory::new();
        let array = NdArray::from(vec![1i32, 2]);
        let encoded = NdArrayCodec
            .serialize(&Value::NdArray(array), &factory)
            .unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&(4u32 + 4 + 4 + 5 + 8).to_be_bytes());
        expected.extend_from_slice(&1u32.to_be_bytes());
        expected.extend_from_slice(&2u32.to_be_bytes());
        expected.extend_from_slice(&5u32.to_be_bytes());
        expected.extend_from_slice(b"int32");
        expected.extend_from_slice(&1i32.to_be_bytes());
        expected.extend_from_slice(&2i32.to_be_bytes());
        assert_eq!(encoded.as_ref(), expected.as_slice());
    }

    #[test]
    fn new_rejects_shape_mismatch() {
        let result = NdArray::new(vec![2, 2], ArrayData::Int64(vec![1, 2, 3]));
        assert!(matches!(
            result,
            Err(CodecError::ShapeMismatch {
                expected: 4,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let factory = SerializableFactory::new();
        let mut wire = BytesMut::new();
        let mut payload = BytesMut::new();
        put_len(&mut payload, 1).unwrap();
        put_len(&mut payload, 3).unwrap();
        write_segment(&mut payload, b"int64").unwrap();
        payload.put_i64(1);
        write_segment(&mut wire, &payload).unwrap();

        let err = NdArrayCodec.decode(&wire, &factory).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Truncated {
                needed: 24,
                remaining: 8
            }
        ));
    }

    #[test]
    fn decode_rejects_unknown_dtype() {
        let factory = SerializableFactory::new();
        let mut wire = BytesMut::new();
        let mut payload = BytesMut::new();
        put_len(&mut payload, 0).unwrap();
        write_segment(&mut payload, b"float16").unwrap();
        payload.put_u16(0);
        write_segment(&mut wire, &payload).unwrap();

        let err = NdArrayCodec.decode(&wire, &factory).unwrap_err();
        assert!(matches!(err, CodecError::InvalidData { .. }));
    }

    #[test]
    fn decode_rejects_huge_ndim_without_allocating() {
        let factory = SerializableFactory::new();
        let mut wire = BytesMut::new();
        let mut payload = BytesMut::new();
        put_len(&mut payload, u32::MAX as usize).unwrap();
        write_segment(&mut wire, &payload).unwrap();

        let err = NdArrayCodec.decode(&wire, &factory).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }

    #[test]
    fn encode_rejects_other_types() {
        let factory = SerializableFactory::new();
        let err = NdArrayCodec
            .serialize(&Value::from("not an array"), &factory)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::TypeMismatch {
                codec: "ndarray",
                ..
            }
        ));
    }

    #[test]
    fn all_close_compares_across_dtypes() {
        let ints = NdArray::from(vec![1i64, 2, 3]);
        let floats = NdArray::from(vec![1.0f64, 2.0, 3.000_000_1]);
        assert!(ints.all_close(&floats));
        assert!(!ints.all_close(&NdArray::from(vec![1.0f64, 2.0, 3.1])));
        assert!(!ints.all_close(&ints.clone().reshape(vec![3, 1]).unwrap()));
    }

    #[test]
    fn dtype_names_roundtrip() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_name(dtype.name()), Some(dtype));
        }
        assert_eq!(DType::Complex128.itemsize(), 16);
        assert_eq!(DType::from_name("object"), None);
    }
}
