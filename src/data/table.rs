//! Columnar Tables
//!
//! Ordered, named 1-D columns of equal length.

use crate::data::TypedBuffer;
use crate::error::{BridgeError, Result};

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: TypedBuffer,
}

/// A table of equal-length columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnarTable {
    columns: Vec<Column>,
}

impl ColumnarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; it must be 1-D and as long as the existing ones.
    pub fn push(&mut self, name: impl Into<String>, data: TypedBuffer) -> Result<()> {
        if data.ndim() != 1 {
            return Err(BridgeError::InvalidRank {
                expected: 1,
                got: data.ndim(),
            });
        }
        if let Some(first) = self.columns.first() {
            if first.data.len() != data.len() {
                return Err(BridgeError::ShapeMismatch {
                    expected: format!("{} rows", first.data.len()),
                    got: format!("{} rows", data.len()),
                });
            }
        }
        self.columns.push(Column {
            name: name.into(),
            data,
        });
        Ok(())
    }

    /// Builder form of `push`.
    pub fn with_column(mut self, name: impl Into<String>, data: TypedBuffer) -> Result<Self> {
        self.push(name, data)?;
        Ok(self)
    }

    /// Rename columns in order; extra names are ignored.
    pub fn with_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        for (column, name) in self.columns.iter_mut().zip(names) {
            column.name = name.as_ref().to_string();
        }
        self
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&TypedBuffer> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}
