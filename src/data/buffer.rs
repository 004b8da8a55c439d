//! Typed Buffers
//!
//! Homogeneous host arrays, the unit of transfer into native containers.

use ndarray::{Array1, ArrayD, IxDyn};

use crate::error::{BridgeError, Result};
use crate::ffi::ElementKind;

/// A homogeneous N-D host array of one element kind
#[derive(Debug, Clone, PartialEq)]
pub enum TypedBuffer {
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    Text(ArrayD<String>),
    Bool(ArrayD<bool>),
}

/// Rust element types that map onto a `TypedBuffer` variant
pub trait Element: Clone + 'static {
    const KIND: ElementKind;

    fn wrap(array: ArrayD<Self>) -> TypedBuffer;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$variant;

                fn wrap(array: ArrayD<Self>) -> TypedBuffer {
                    TypedBuffer::$variant(array)
                }
            }
        )*
    };
}

impl_element! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Text,
    bool => Bool,
}

/// Apply `$body` to the inner array of any variant.
macro_rules! with_array {
    ($buf:expr, $a:ident => $body:expr) => {
        match $buf {
            TypedBuffer::I8($a) => $body,
            TypedBuffer::I16($a) => $body,
            TypedBuffer::I32($a) => $body,
            TypedBuffer::I64($a) => $body,
            TypedBuffer::U8($a) => $body,
            TypedBuffer::U16($a) => $body,
            TypedBuffer::U32($a) => $body,
            TypedBuffer::U64($a) => $body,
            TypedBuffer::F32($a) => $body,
            TypedBuffer::F64($a) => $body,
            TypedBuffer::Text($a) => $body,
            TypedBuffer::Bool($a) => $body,
        }
    };
}

impl TypedBuffer {
    /// Build an N-D buffer from a flat row-major vector.
    pub fn from_shape_vec<T: Element>(shape: &[usize], values: Vec<T>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        let got = values.len();
        ArrayD::from_shape_vec(IxDyn(shape), values)
            .map(T::wrap)
            .map_err(|_| BridgeError::ShapeMismatch {
                expected: format!("{} elements for shape {:?}", expected, shape),
                got: format!("{} elements", got),
            })
    }

    /// Build a `rows` x `cols` matrix from row-major values.
    pub fn matrix<T: Element>(rows: usize, cols: usize, values: Vec<T>) -> Result<Self> {
        Self::from_shape_vec(&[rows, cols], values)
    }

    /// Element kind of this buffer.
    pub fn kind(&self) -> ElementKind {
        match self {
            TypedBuffer::I8(_) => ElementKind::I8,
            TypedBuffer::I16(_) => ElementKind::I16,
            TypedBuffer::I32(_) => ElementKind::I32,
            TypedBuffer::I64(_) => ElementKind::I64,
            TypedBuffer::U8(_) => ElementKind::U8,
            TypedBuffer::U16(_) => ElementKind::U16,
            TypedBuffer::U32(_) => ElementKind::U32,
            TypedBuffer::U64(_) => ElementKind::U64,
            TypedBuffer::F32(_) => ElementKind::F32,
            TypedBuffer::F64(_) => ElementKind::F64,
            TypedBuffer::Text(_) => ElementKind::Text,
            TypedBuffer::Bool(_) => ElementKind::Bool,
        }
    }

    pub fn ndim(&self) -> usize {
        with_array!(self, a => a.ndim())
    }

    pub fn shape(&self) -> &[usize] {
        with_array!(self, a => a.shape())
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        with_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric values widened to f64 in logical (row-major) order.
    ///
    /// Returns `None` for text and boolean buffers.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        let values = match self {
            TypedBuffer::I8(a) => a.iter().map(|&v| v as f64).collect(),
            TypedBuffer::I16(a) => a.iter().map(|&v| v as f64).collect(),
            TypedBuffer::I32(a) => a.iter().map(|&v| v as f64).collect(),
            TypedBuffer::I64(a) => a.iter().map(|&v| v as f64).collect(),
            TypedBuffer::U8(a) => a.iter().map(|&v| v as f64).collect(),
            TypedBuffer::U16(a) => a.iter().map(|&v| v as f64).collect(),
            TypedBuffer::U32(a) => a.iter().map(|&v| v as f64).collect(),
            TypedBuffer::U64(a) => a.iter().map(|&v| v as f64).collect(),
            TypedBuffer::F32(a) => a.iter().map(|&v| v as f64).collect(),
            TypedBuffer::F64(a) => a.iter().copied().collect(),
            TypedBuffer::Text(_) | TypedBuffer::Bool(_) => return None,
        };
        Some(values)
    }

    /// Text values, or `None` if this is not a text buffer.
    pub fn as_text(&self) -> Option<Vec<&str>> {
        match self {
            TypedBuffer::Text(a) => Some(a.iter().map(String::as_str).collect()),
            _ => None,
        }
    }
}

impl<T: Element> From<Vec<T>> for TypedBuffer {
    fn from(values: Vec<T>) -> Self {
        T::wrap(Array1::from_vec(values).into_dyn())
    }
}

impl<T: Element> From<ArrayD<T>> for TypedBuffer {
    fn from(array: ArrayD<T>) -> Self {
        T::wrap(array)
    }
}

impl From<Vec<&str>> for TypedBuffer {
    fn from(values: Vec<&str>) -> Self {
        values
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<String>>()
            .into()
    }
}
