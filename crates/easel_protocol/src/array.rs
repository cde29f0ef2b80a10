//! Numeric array codec
//!
//! Bulk arguments travel as a `{shape, dtype}` descriptor plus one contiguous little-endian byte
//! buffer. The remote side maps every dtype onto a JavaScript typed array, so the encoder
//! narrows the types that have no typed-array counterpart:
//!
//! | input dtype | wire dtype |
//! |-------------|------------|
//! | int64       | int32      |
//! | uint64      | uint32     |
//! | float16     | float32    |
//!
//! Strided views are materialized in row-major order before encoding.

use crate::errors::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use half::f16;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float16,
    Float32,
    Float64,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::Int8 => "int8",
            DType::Uint8 => "uint8",
            DType::Int16 => "int16",
            DType::Uint16 => "uint16",
            DType::Int32 => "int32",
            DType::Uint32 => "uint32",
            DType::Int64 => "int64",
            DType::Uint64 => "uint64",
            DType::Float16 => "float16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    /// Size of one element in bytes
    pub fn itemsize(self) -> usize {
        match self {
            DType::Int8 | DType::Uint8 => 1,
            DType::Int16 | DType::Uint16 | DType::Float16 => 2,
            DType::Int32 | DType::Uint32 | DType::Float32 => 4,
            DType::Int64 | DType::Uint64 | DType::Float64 => 8,
        }
    }

    /// The dtype this one is sent as
    pub fn normalized(self) -> DType {
        match self {
            DType::Int64 => DType::Int32,
            DType::Uint64 => DType::Uint32,
            DType::Float16 => DType::Float32,
            other => other,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::Float16 | DType::Float32 | DType::Float64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed element storage of an array
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Int64(Vec<i64>),
    Uint64(Vec<u64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Evaluates `$body` with `$v` bound to the vector of whatever variant `$data` holds
macro_rules! with_vec {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::Int8($v) => $body,
            ArrayData::Uint8($v) => $body,
            ArrayData::Int16($v) => $body,
            ArrayData::Uint16($v) => $body,
            ArrayData::Int32($v) => $body,
            ArrayData::Uint32($v) => $body,
            ArrayData::Int64($v) => $body,
            ArrayData::Uint64($v) => $body,
            ArrayData::Float16($v) => $body,
            ArrayData::Float32($v) => $body,
            ArrayData::Float64($v) => $body,
        }
    };
}

/// Like `with_vec!`, but wraps the result back into the same variant
macro_rules! map_same {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::Int8($v) => ArrayData::Int8($body),
            ArrayData::Uint8($v) => ArrayData::Uint8($body),
            ArrayData::Int16($v) => ArrayData::Int16($body),
            ArrayData::Uint16($v) => ArrayData::Uint16($body),
            ArrayData::Int32($v) => ArrayData::Int32($body),
            ArrayData::Uint32($v) => ArrayData::Uint32($body),
            ArrayData::Int64($v) => ArrayData::Int64($body),
            ArrayData::Uint64($v) => ArrayData::Uint64($body),
            ArrayData::Float16($v) => ArrayData::Float16($body),
            ArrayData::Float32($v) => ArrayData::Float32($body),
            ArrayData::Float64($v) => ArrayData::Float64($body),
        }
    };
}

/// Casts every element to `$target` with `as` semantics (integers wrap, floats saturate)
macro_rules! cast_all {
    ($data:expr, $target:ty) => {
        match $data {
            ArrayData::Float16(v) => v
                .iter()
                .map(|x| x.to_f32() as $target)
                .collect::<Vec<$target>>(),
            ArrayData::Int8(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
            ArrayData::Uint8(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
            ArrayData::Int16(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
            ArrayData::Uint16(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
            ArrayData::Int32(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
            ArrayData::Uint32(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
            ArrayData::Int64(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
            ArrayData::Uint64(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
            ArrayData::Float32(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
            ArrayData::Float64(v) => v.iter().map(|x| *x as $target).collect::<Vec<$target>>(),
        }
    };
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for ArrayData {
                fn from(values: Vec<$ty>) -> Self {
                    ArrayData::$variant(values)
                }
            }

            impl From<Vec<$ty>> for NdArray {
                fn from(values: Vec<$ty>) -> Self {
                    NdArray::from_data(ArrayData::$variant(values))
                }
            }

            impl From<&[$ty]> for NdArray {
                fn from(values: &[$ty]) -> Self {
                    NdArray::from_data(ArrayData::$variant(values.to_vec()))
                }
            }
        )*
    };
}

impl_from_vec!(
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    i64 => Int64,
    u64 => Uint64,
    f16 => Float16,
    f32 => Float32,
    f64 => Float64,
);

impl ArrayData {
    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Int8(_) => DType::Int8,
            ArrayData::Uint8(_) => DType::Uint8,
            ArrayData::Int16(_) => DType::Int16,
            ArrayData::Uint16(_) => DType::Uint16,
            ArrayData::Int32(_) => DType::Int32,
            ArrayData::Uint32(_) => DType::Uint32,
            ArrayData::Int64(_) => DType::Int64,
            ArrayData::Uint64(_) => DType::Uint64,
            ArrayData::Float16(_) => DType::Float16,
            ArrayData::Float32(_) => DType::Float32,
            ArrayData::Float64(_) => DType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        with_vec!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Picks the elements at the given storage positions
    fn gather(&self, indices: &[usize]) -> ArrayData {
        map_same!(self, v => indices.iter().map(|&i| v[i]).collect())
    }

    /// Concatenates parts of one dtype. Returns None when the dtypes differ.
    pub(crate) fn concat(parts: &[ArrayData]) -> Option<ArrayData> {
        let first = parts.first()?;
        let mut out = map_same!(first, v => Vec::with_capacity(v.len() * parts.len()));
        for part in parts {
            match (&mut out, part) {
                (ArrayData::Int8(o), ArrayData::Int8(p)) => o.extend_from_slice(p),
                (ArrayData::Uint8(o), ArrayData::Uint8(p)) => o.extend_from_slice(p),
                (ArrayData::Int16(o), ArrayData::Int16(p)) => o.extend_from_slice(p),
                (ArrayData::Uint16(o), ArrayData::Uint16(p)) => o.extend_from_slice(p),
                (ArrayData::Int32(o), ArrayData::Int32(p)) => o.extend_from_slice(p),
                (ArrayData::Uint32(o), ArrayData::Uint32(p)) => o.extend_from_slice(p),
                (ArrayData::Int64(o), ArrayData::Int64(p)) => o.extend_from_slice(p),
                (ArrayData::Uint64(o), ArrayData::Uint64(p)) => o.extend_from_slice(p),
                (ArrayData::Float16(o), ArrayData::Float16(p)) => o.extend_from_slice(p),
                (ArrayData::Float32(o), ArrayData::Float32(p)) => o.extend_from_slice(p),
                (ArrayData::Float64(o), ArrayData::Float64(p)) => o.extend_from_slice(p),
                _ => return None,
            }
        }
        Some(out)
    }

    fn write_le(&self, out: &mut BytesMut) {
        match self {
            ArrayData::Int8(v) => v.iter().for_each(|x| out.put_i8(*x)),
            ArrayData::Uint8(v) => out.put_slice(v),
            ArrayData::Int16(v) => v.iter().for_each(|x| out.put_i16_le(*x)),
            ArrayData::Uint16(v) => v.iter().for_each(|x| out.put_u16_le(*x)),
            ArrayData::Float16(v) => v.iter().for_each(|x| out.put_u16_le(x.to_bits())),
            ArrayData::Int32(v) => v.iter().for_each(|x| out.put_i32_le(*x)),
            ArrayData::Uint32(v) => v.iter().for_each(|x| out.put_u32_le(*x)),
            ArrayData::Int64(v) => v.iter().for_each(|x| out.put_i64_le(*x)),
            ArrayData::Uint64(v) => v.iter().for_each(|x| out.put_u64_le(*x)),
            ArrayData::Float32(v) => v.iter().for_each(|x| out.put_f32_le(*x)),
            ArrayData::Float64(v) => v.iter().for_each(|x| out.put_f64_le(*x)),
        }
    }

    fn read_le(dtype: DType, mut buf: &[u8], count: usize) -> ArrayData {
        match dtype {
            DType::Int8 => ArrayData::Int8((0..count).map(|_| buf.get_i8()).collect()),
            DType::Uint8 => ArrayData::Uint8(buf[..count].to_vec()),
            DType::Int16 => ArrayData::Int16((0..count).map(|_| buf.get_i16_le()).collect()),
            DType::Uint16 => ArrayData::Uint16((0..count).map(|_| buf.get_u16_le()).collect()),
            DType::Int32 => ArrayData::Int32((0..count).map(|_| buf.get_i32_le()).collect()),
            DType::Uint32 => ArrayData::Uint32((0..count).map(|_| buf.get_u32_le()).collect()),
            DType::Int64 => ArrayData::Int64((0..count).map(|_| buf.get_i64_le()).collect()),
            DType::Uint64 => ArrayData::Uint64((0..count).map(|_| buf.get_u64_le()).collect()),
            DType::Float16 => {
                ArrayData::Float16((0..count).map(|_| f16::from_bits(buf.get_u16_le())).collect())
            }
            DType::Float32 => ArrayData::Float32((0..count).map(|_| buf.get_f32_le()).collect()),
            DType::Float64 => ArrayData::Float64((0..count).map(|_| buf.get_f64_le()).collect()),
        }
    }
}

/// N-dimensional numeric array. The shape is logical; `strides` (in elements) and `offset`
/// describe where each logical element lives in `data`, so transposed or sliced views can be
/// represented without copying.
#[derive(Debug, Clone)]
pub struct NdArray {
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    data: ArrayData,
}

fn row_major_strides(shape: &[usize]) -> Vec<isize> {
    let mut strides = vec![1isize; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1] as isize;
    }
    strides
}

impl NdArray {
    /// One-dimensional array over all of `data`
    pub fn from_data(data: ArrayData) -> Self {
        let shape = vec![data.len()];
        Self {
            strides: row_major_strides(&shape),
            shape,
            offset: 0,
            data,
        }
    }

    /// Row-major array with the given shape
    pub fn new(shape: Vec<usize>, data: impl Into<ArrayData>) -> Result<Self, ProtocolError> {
        let data = data.into();
        let len: usize = shape.iter().product();
        if len != data.len() {
            return Err(ProtocolError::ShapeMismatch {
                shape,
                len: data.len(),
            });
        }

        Ok(Self {
            strides: row_major_strides(&shape),
            shape,
            offset: 0,
            data,
        })
    }

    /// Strided view over `data`. Every reachable element must be inside `data`.
    pub fn with_strides(
        shape: Vec<usize>,
        strides: Vec<isize>,
        offset: usize,
        data: impl Into<ArrayData>,
    ) -> Result<Self, ProtocolError> {
        let data = data.into();
        if strides.len() != shape.len() {
            return Err(ProtocolError::InvalidStrides { shape, strides });
        }

        if shape.iter().all(|&dim| dim > 0) {
            let (mut low, mut high) = (offset as isize, offset as isize);
            for (&dim, &stride) in shape.iter().zip(&strides) {
                let reach = (dim as isize - 1) * stride;
                if reach < 0 {
                    low += reach;
                } else {
                    high += reach;
                }
            }
            if low < 0 || high >= data.len() as isize {
                return Err(ProtocolError::InvalidStrides { shape, strides });
            }
        }

        Ok(Self {
            shape,
            strides,
            offset,
            data,
        })
    }

    /// `(n, 2)` float64 array of points
    pub fn from_points(points: &[[f64; 2]]) -> Self {
        let flat: Vec<f64> = points.iter().flat_map(|p| p.iter().copied()).collect();
        Self {
            shape: vec![points.len(), 2],
            strides: vec![2, 1],
            offset: 0,
            data: ArrayData::Float64(flat),
        }
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

    /// Number of logical elements
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw storage. Only meaningful in logical order for contiguous arrays.
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn is_contiguous(&self) -> bool {
        self.offset == 0
            && self.data.len() == self.len()
            && self.strides == row_major_strides(&self.shape)
    }

    /// Storage positions of all logical elements in row-major order
    fn logical_indices(&self) -> Vec<usize> {
        let count = self.len();
        let mut indices = Vec::with_capacity(count);
        let mut index = vec![0usize; self.shape.len()];

        for _ in 0..count {
            let pos = index
                .iter()
                .zip(&self.strides)
                .fold(self.offset as isize, |acc, (&i, &stride)| {
                    acc + i as isize * stride
                });
            indices.push(pos as usize);

            for axis in (0..index.len()).rev() {
                index[axis] += 1;
                if index[axis] < self.shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }

        indices
    }

    /// Row-major copy of this array (or a plain clone when it already is row-major)
    pub fn to_contiguous(&self) -> NdArray {
        if self.is_contiguous() {
            return self.clone();
        }

        NdArray {
            shape: self.shape.clone(),
            strides: row_major_strides(&self.shape),
            offset: 0,
            data: self.data.gather(&self.logical_indices()),
        }
    }

    /// View with the axes reversed
    pub fn transpose(&self) -> NdArray {
        NdArray {
            shape: self.shape.iter().rev().copied().collect(),
            strides: self.strides.iter().rev().copied().collect(),
            offset: self.offset,
            data: self.data.clone(),
        }
    }

    /// Row-major copy with a new shape holding the same number of elements
    pub fn reshape(&self, shape: Vec<usize>) -> Result<NdArray, ProtocolError> {
        NdArray::new(shape, self.to_contiguous().data)
    }

    /// Element-wise cast with C `as` semantics
    pub fn astype(&self, dtype: DType) -> NdArray {
        if self.dtype() == dtype {
            return self.clone();
        }

        let data = match dtype {
            DType::Int8 => ArrayData::Int8(cast_all!(&self.data, i8)),
            DType::Uint8 => ArrayData::Uint8(cast_all!(&self.data, u8)),
            DType::Int16 => ArrayData::Int16(cast_all!(&self.data, i16)),
            DType::Uint16 => ArrayData::Uint16(cast_all!(&self.data, u16)),
            DType::Int32 => ArrayData::Int32(cast_all!(&self.data, i32)),
            DType::Uint32 => ArrayData::Uint32(cast_all!(&self.data, u32)),
            DType::Int64 => ArrayData::Int64(cast_all!(&self.data, i64)),
            DType::Uint64 => ArrayData::Uint64(cast_all!(&self.data, u64)),
            DType::Float16 => ArrayData::Float16(
                cast_all!(&self.data, f32)
                    .into_iter()
                    .map(f16::from_f32)
                    .collect(),
            ),
            DType::Float32 => ArrayData::Float32(cast_all!(&self.data, f32)),
            DType::Float64 => ArrayData::Float64(cast_all!(&self.data, f64)),
        };

        NdArray {
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
            data,
        }
    }

    /// All elements in row-major order, as f64
    pub fn to_f64_vec(&self) -> Vec<f64> {
        cast_all!(&self.to_contiguous().data, f64)
    }
}

impl PartialEq for NdArray {
    /// Arrays are equal when their shapes and logical elements match, regardless of layout
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.to_contiguous().data == other.to_contiguous().data
    }
}

/// Metadata accompanying a raw buffer. `idx` is set once the buffer has been given a place in
/// a command's buffer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayDescriptor {
    pub shape: Vec<usize>,
    pub dtype: DType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<usize>,
}

impl ArrayDescriptor {
    pub fn new(shape: Vec<usize>, dtype: DType) -> Self {
        Self {
            shape,
            dtype,
            idx: None,
        }
    }

    pub fn with_index(mut self, idx: usize) -> Self {
        self.idx = Some(idx);
        self
    }

    /// Number of bytes the described buffer must hold
    pub fn byte_len(&self) -> usize {
        self.shape.iter().product::<usize>() * self.dtype.itemsize()
    }
}

/// Turns an array into its wire descriptor and contiguous little-endian bytes
pub fn encode_array(array: &NdArray) -> (ArrayDescriptor, Bytes) {
    let dtype = array.dtype().normalized();
    let normalized = array.astype(dtype).to_contiguous();

    let mut out = BytesMut::with_capacity(normalized.len() * dtype.itemsize());
    normalized.data.write_le(&mut out);

    (
        ArrayDescriptor::new(array.shape().to_vec(), dtype),
        out.freeze(),
    )
}

/// Rebuilds an array from a descriptor and its buffer
pub fn decode_array(bytes: &[u8], descriptor: &ArrayDescriptor) -> Result<NdArray, ProtocolError> {
    let expected = descriptor.byte_len();
    if bytes.len() != expected {
        return Err(ProtocolError::BufferLength {
            dtype: descriptor.dtype,
            shape: descriptor.shape.clone(),
            expected,
            found: bytes.len(),
        });
    }

    let count = descriptor.shape.iter().product();
    let data = ArrayData::read_le(descriptor.dtype, bytes, count);
    NdArray::new(descriptor.shape.clone(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn round_trip(array: &NdArray) -> NdArray {
        let (descriptor, bytes) = encode_array(array);
        decode_array(&bytes, &descriptor).unwrap()
    }

    #[test_case(NdArray::from(vec![-3i8, 0, 7]) ; "int8")]
    #[test_case(NdArray::from(vec![0u8, 128, 255]) ; "uint8")]
    #[test_case(NdArray::from(vec![-300i16, 2, 30000]) ; "int16")]
    #[test_case(NdArray::from(vec![1u16, 65535]) ; "uint16")]
    #[test_case(NdArray::from(vec![i32::MIN, -1, i32::MAX]) ; "int32")]
    #[test_case(NdArray::from(vec![0u32, u32::MAX]) ; "uint32")]
    #[test_case(NdArray::from(vec![1.5f32, -0.25, 1e9]) ; "float32")]
    #[test_case(NdArray::from(vec![0.1f64, -2.5, 1e300]) ; "float64")]
    fn supported_dtypes_round_trip_exactly(array: NdArray) {
        let decoded = round_trip(&array);
        assert_eq!(decoded.dtype(), array.dtype());
        assert_eq!(decoded, array);
    }

    #[test]
    fn int64_is_narrowed_to_int32() {
        let array = NdArray::new(vec![2, 2], vec![1i64, -2, 3, (1i64 << 32) + 5]).unwrap();
        let (descriptor, bytes) = encode_array(&array);
        assert_eq!(descriptor.dtype, DType::Int32);
        assert_eq!(descriptor.shape, vec![2, 2]);
        assert_eq!(bytes.len(), 16);

        let decoded = decode_array(&bytes, &descriptor).unwrap();
        assert_eq!(decoded, array.astype(DType::Int32));
        assert_eq!(decoded.data(), &ArrayData::Int32(vec![1, -2, 3, 5]));
    }

    #[test]
    fn uint64_is_narrowed_to_uint32() {
        let array = NdArray::from(vec![7u64, 42]);
        let decoded = round_trip(&array);
        assert_eq!(decoded.data(), &ArrayData::Uint32(vec![7, 42]));
    }

    #[test]
    fn float16_is_widened_to_float32() {
        // 1.0, -2.0, 0.5 and 2^-24 (smallest subnormal)
        let bits = [0x3c00u16, 0xc000, 0x3800, 0x0001];
        let array = NdArray::from(bits.map(f16::from_bits).to_vec());
        let (descriptor, bytes) = encode_array(&array);
        assert_eq!(descriptor.dtype, DType::Float32);

        let decoded = decode_array(&bytes, &descriptor).unwrap();
        assert_eq!(
            decoded.data(),
            &ArrayData::Float32(vec![1.0, -2.0, 0.5, f32::powi(2.0, -24)])
        );
        assert_eq!(decoded, array.astype(DType::Float32));
    }

    #[test]
    fn casting_to_float16_rounds_to_nearest_even() {
        // 1 + 2^-11 sits halfway between 1.0 and the next half, 1 + 2^-10
        let step = f32::powi(2.0, -11);
        let array = NdArray::from(vec![1.0f32 + step, 1.0 + 3.0 * step, 1e10]);
        let ArrayData::Float16(values) = array.astype(DType::Float16).data().clone() else {
            panic!("expected float16 data");
        };
        let bits: Vec<u16> = values.iter().map(|x| x.to_bits()).collect();
        assert_eq!(bits, vec![0x3c00, 0x3c02, 0x7c00]);
    }

    #[test]
    fn strided_views_are_made_contiguous() {
        // [[0, 1, 2], [3, 4, 5]] transposed is [[0, 3], [1, 4], [2, 5]]
        let array = NdArray::new(vec![2, 3], vec![0i32, 1, 2, 3, 4, 5]).unwrap();
        let transposed = array.transpose();
        assert!(!transposed.is_contiguous());

        let (descriptor, bytes) = encode_array(&transposed);
        assert_eq!(descriptor.shape, vec![3, 2]);

        let decoded = decode_array(&bytes, &descriptor).unwrap();
        assert_eq!(decoded.data(), &ArrayData::Int32(vec![0, 3, 1, 4, 2, 5]));
    }

    #[test]
    fn negative_strides() {
        let reversed = NdArray::with_strides(vec![4], vec![-1], 3, vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(reversed.to_f64_vec(), vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn strides_must_stay_in_bounds() {
        let result = NdArray::with_strides(vec![3], vec![2], 0, vec![1u8, 2, 3, 4]);
        assert!(matches!(result, Err(ProtocolError::InvalidStrides { .. })));
    }

    #[test]
    fn shape_must_match_data() {
        let result = NdArray::new(vec![2, 2], vec![1.0f32, 2.0, 3.0]);
        assert!(matches!(result, Err(ProtocolError::ShapeMismatch { len: 3, .. })));
    }

    #[test]
    fn decode_rejects_short_buffers() {
        let descriptor = ArrayDescriptor::new(vec![3], DType::Float64);
        let result = decode_array(&[0u8; 16], &descriptor);
        assert!(matches!(
            result,
            Err(ProtocolError::BufferLength {
                expected: 24,
                found: 16,
                ..
            })
        ));
    }

    #[test]
    fn bytes_are_little_endian() {
        let (_, bytes) = encode_array(&NdArray::from(vec![1i32, 256]));
        assert_eq!(&bytes[..], &[1, 0, 0, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn descriptor_json_layout() {
        let descriptor = ArrayDescriptor::new(vec![3], DType::Float32).with_index(2);
        let json = serde_json::to_string(&descriptor).unwrap();
        assert_eq!(json, r#"{"shape":[3],"dtype":"float32","idx":2}"#);

        let plain = ArrayDescriptor::new(vec![5], DType::Uint8);
        assert_eq!(
            serde_json::to_string(&plain).unwrap(),
            r#"{"shape":[5],"dtype":"uint8"}"#
        );
    }

    #[test]
    fn empty_and_zero_dimensional_arrays() {
        let empty = NdArray::from(Vec::<f64>::new());
        let decoded = round_trip(&empty);
        assert!(decoded.is_empty());
        assert_eq!(decoded.shape(), &[0]);

        let scalar = NdArray::new(vec![], vec![4.5f64]).unwrap();
        let decoded = round_trip(&scalar);
        assert_eq!(decoded.shape(), &[] as &[usize]);
        assert_eq!(decoded.to_f64_vec(), vec![4.5]);
    }
}
