//! Data Ingestion
//!
//! Attaches host buffers to containers. Values are copied into memory the
//! container keeps alive, so the caller's buffer may be dropped or mutated
//! as soon as a put returns.

use std::ffi::{c_char, c_int, c_uint, c_void, CString};

use ndarray::ArrayD;
use tracing::trace;

use crate::data::TypedBuffer;
use crate::error::{BridgeError, Result};

use super::{Container, Retained};

impl Container<'_> {
    /// Attach one column to a vector-backed container.
    pub fn put_vector(&self, column: usize, buffer: &TypedBuffer) -> Result<()> {
        let handle = self.session.handle()?;
        if !self.family.is_vector_backed() {
            return Err(BridgeError::InvalidFamily(format!("{} does not take vectors", self.family)));
        }
        if column >= self.n_columns {
            return Err(BridgeError::ColumnOutOfRange {
                column,
                n_columns: self.n_columns,
            });
        }
        if buffer.ndim() != 1 {
            return Err(BridgeError::InvalidRank {
                expected: 1,
                got: buffer.ndim(),
            });
        }
        if buffer.len() != self.n_rows {
            return Err(BridgeError::ShapeMismatch {
                expected: format!("{} rows", self.n_rows),
                got: format!("{} rows", buffer.len()),
            });
        }
        check_exact(buffer)?;
        let type_code = self.type_code(buffer)?;

        let (values, retained) = native_copy(buffer)?;
        // Safety: `values` points into `retained`, which the container keeps
        // until the native object is destroyed.
        let status = unsafe {
            self.session
                .api()
                .put_vector(handle, self.ptr, column as c_uint, type_code as c_uint, values)
        };
        if status != 0 {
            return Err(BridgeError::PutFailed { what: "vector", status });
        }
        self.retain(retained);
        trace!(column, kind = %buffer.kind(), rows = buffer.len(), "put vector");
        Ok(())
    }

    /// Attach the whole value matrix to a matrix-backed container.
    ///
    /// Values are row-major; images are band-sequential
    /// (`bands x rows x cols`). `pad` is the padding already present in
    /// `buffer`, normally zero.
    pub fn put_matrix(&self, buffer: &TypedBuffer, pad: c_int) -> Result<()> {
        let handle = self.session.handle()?;
        if !self.family.is_matrix_backed() {
            return Err(BridgeError::InvalidFamily(format!("{} does not take a matrix", self.family)));
        }
        let expected: Vec<usize> = if self.family.is_image() {
            vec![self.n_bands, self.n_rows, self.n_columns]
        } else {
            vec![self.n_rows, self.n_columns]
        };
        if buffer.ndim() != expected.len() {
            return Err(BridgeError::InvalidRank {
                expected: expected.len(),
                got: buffer.ndim(),
            });
        }
        if !buffer.kind().is_numeric() {
            return Err(BridgeError::UnsupportedDType(buffer.kind().to_string()));
        }
        // Padding surrounds the two spatial axes.
        let (rank, pad_cells) = (expected.len(), 2 * pad.max(0) as usize);
        let padded: Vec<usize> = expected
            .iter()
            .enumerate()
            .map(|(axis, &n)| if axis + 2 >= rank { n + pad_cells } else { n })
            .collect();
        if buffer.shape() != padded.as_slice() {
            return Err(BridgeError::ShapeMismatch {
                expected: format!("{:?}", padded),
                got: format!("{:?}", buffer.shape()),
            });
        }
        check_exact(buffer)?;
        let type_code = self.type_code(buffer)?;

        let (values, retained) = native_copy(buffer)?;
        // Safety: as in `put_vector`.
        let status = unsafe {
            self.session
                .api()
                .put_matrix(handle, self.ptr, type_code as c_uint, pad, values)
        };
        if status != 0 {
            return Err(BridgeError::PutFailed { what: "matrix", status });
        }
        self.retain(retained);
        trace!(kind = %buffer.kind(), shape = ?buffer.shape(), "put matrix");
        Ok(())
    }

    /// Attach trailing text, one string per row.
    pub fn put_strings<S: AsRef<str>>(&self, strings: &[S]) -> Result<()> {
        let handle = self.session.handle()?;
        let target = if self.family.is_vector_backed() {
            "GMT_IS_VECTOR"
        } else if self.family.is_matrix_backed() {
            "GMT_IS_MATRIX"
        } else {
            return Err(BridgeError::InvalidFamily(format!("{} does not take strings", self.family)));
        };
        if strings.len() != self.n_rows {
            return Err(BridgeError::ShapeMismatch {
                expected: format!("{} strings", self.n_rows),
                got: format!("{} strings", strings.len()),
            });
        }
        let family = self.session.constant(target)? + self.session.constant("GMT_IS_DUPLICATE")?;

        let (_owned, mut pointers) = c_strings(strings.iter().map(AsRef::as_ref))?;
        // Safety: the library duplicates each string before returning.
        let status = unsafe {
            self.session
                .api()
                .put_strings(handle, family as c_uint, self.ptr, pointers.as_mut_ptr())
        };
        if status != 0 {
            return Err(BridgeError::PutFailed { what: "strings", status });
        }
        Ok(())
    }

    fn type_code(&self, buffer: &TypedBuffer) -> Result<c_int> {
        let kind = buffer.kind();
        let name = kind
            .gmt_type()
            .ok_or_else(|| BridgeError::UnsupportedDType(kind.to_string()))?;
        self.session.constant(name)
    }
}

/// Largest integer magnitude a double holds exactly.
pub const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Module output is double precision; reject 64-bit integers it would round.
pub(crate) fn check_exact(buffer: &TypedBuffer) -> Result<()> {
    let inexact = match buffer {
        TypedBuffer::I64(a) => a.iter().find(|v| v.unsigned_abs() > MAX_EXACT_INTEGER).map(i64::to_string),
        TypedBuffer::U64(a) => a.iter().find(|&&v| v > MAX_EXACT_INTEGER).map(u64::to_string),
        _ => None,
    };
    match inexact {
        Some(value) => Err(BridgeError::InexactValue {
            kind: buffer.kind().to_string(),
            value,
        }),
        None => Ok(()),
    }
}

/// Copy `buffer` into retained memory and return the pointer GMT should read.
fn native_copy(buffer: &TypedBuffer) -> Result<(*mut c_void, Retained)> {
    fn values<T: Copy + 'static>(array: &ArrayD<T>) -> (*mut c_void, Retained) {
        let mut values: Vec<T> = array.iter().copied().collect();
        let ptr = values.as_mut_ptr().cast::<c_void>();
        (ptr, Retained::Values { _values: Box::new(values) })
    }

    Ok(match buffer {
        TypedBuffer::I8(a) => values(a),
        TypedBuffer::I16(a) => values(a),
        TypedBuffer::I32(a) => values(a),
        TypedBuffer::I64(a) => values(a),
        TypedBuffer::U8(a) => values(a),
        TypedBuffer::U16(a) => values(a),
        TypedBuffer::U32(a) => values(a),
        TypedBuffer::U64(a) => values(a),
        TypedBuffer::F32(a) => values(a),
        TypedBuffer::F64(a) => values(a),
        TypedBuffer::Text(a) => {
            let (owned, mut pointers) = c_strings(a.iter().map(String::as_str))?;
            let ptr = pointers.as_mut_ptr().cast::<c_void>();
            (
                ptr,
                Retained::Text {
                    _owned: owned,
                    _pointers: pointers,
                },
            )
        }
        TypedBuffer::Bool(_) => return Err(BridgeError::UnsupportedDType(buffer.kind().to_string())),
    })
}

/// NUL-terminated copies plus the `char**` array pointing at them.
fn c_strings<'a>(strings: impl Iterator<Item = &'a str>) -> Result<(Vec<CString>, Vec<*mut c_char>)> {
    let owned = strings
        .map(|s| {
            CString::new(s)
                .map_err(|_| BridgeError::InvalidArgument(format!("string contains a NUL byte: {:?}", s)))
        })
        .collect::<Result<Vec<_>>>()?;
    let pointers = owned.iter().map(|s| s.as_ptr() as *mut c_char).collect();
    Ok((owned, pointers))
}
