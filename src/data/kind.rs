//! Input Classification
//!
//! Every caller-supplied payload is classified once into a closed `DataKind`
//! that downstream code matches exhaustively.

use std::path::Path;

use crate::data::{ColumnarTable, Raster, TypedBuffer};
use crate::error::{BridgeError, Result};

/// Host payload handed to the bridge
#[derive(Debug, Clone, Copy)]
pub enum HostData<'a> {
    /// A real file on disk (or any string GMT accepts as a file name)
    Path(&'a Path),
    /// A numeric array: 1-D is a single column, 2-D is a matrix
    Array(&'a TypedBuffer),
    /// Named columns
    Table(&'a ColumnarTable),
    /// A grid or an image
    Raster(&'a Raster),
}

/// What kind of native input a payload becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    File,
    Matrix,
    Vectors,
    Grid,
    Image,
    /// No `data`, columns come from separately supplied vectors
    Empty,
}

/// Classify the payload.
///
/// `vectors` are the separately supplied x/y/z/... columns; they are only
/// valid when `data` is absent.
pub fn classify(data: Option<&HostData<'_>>, vectors: &[&TypedBuffer]) -> Result<DataKind> {
    match (data, vectors.is_empty()) {
        (None, true) => Err(BridgeError::NoInputData),
        (None, false) => Ok(DataKind::Empty),
        (Some(_), false) => Err(BridgeError::InvalidArgument(
            "too much data: pass either data or separate vectors, not both".to_string(),
        )),
        (Some(data), true) => Ok(match data {
            HostData::Path(_) => DataKind::File,
            HostData::Table(_) => DataKind::Vectors,
            HostData::Raster(r) if r.is_image() => DataKind::Image,
            HostData::Raster(_) => DataKind::Grid,
            HostData::Array(a) => match a.ndim() {
                1 => DataKind::Vectors,
                2 => DataKind::Matrix,
                got => return Err(BridgeError::InvalidRank { expected: 2, got }),
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_classify_every_kind() {
        let path = Path::new("input.txt");
        assert_eq!(classify(Some(&HostData::Path(path)), &[]).unwrap(), DataKind::File);

        let col = TypedBuffer::from(vec![1.0f64, 2.0]);
        assert_eq!(classify(Some(&HostData::Array(&col)), &[]).unwrap(), DataKind::Vectors);

        let m = TypedBuffer::matrix(2, 2, vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(classify(Some(&HostData::Array(&m)), &[]).unwrap(), DataKind::Matrix);

        let table = ColumnarTable::new();
        assert_eq!(classify(Some(&HostData::Table(&table)), &[]).unwrap(), DataKind::Vectors);

        let grid = Raster::grid(Array2::zeros((2, 2)), vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        assert_eq!(classify(Some(&HostData::Raster(&grid)), &[]).unwrap(), DataKind::Grid);

        let image = Raster::image(Array3::zeros((3, 2, 2)), vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        assert_eq!(classify(Some(&HostData::Raster(&image)), &[]).unwrap(), DataKind::Image);

        assert_eq!(classify(None, &[&col, &col]).unwrap(), DataKind::Empty);
    }

    #[test]
    fn test_classify_errors() {
        assert!(matches!(classify(None, &[]), Err(BridgeError::NoInputData)));

        let col = TypedBuffer::from(vec![1u8]);
        let path = Path::new("x.txt");
        assert!(matches!(
            classify(Some(&HostData::Path(path)), &[&col]),
            Err(BridgeError::InvalidArgument(_))
        ));

        let cube = TypedBuffer::from_shape_vec(&[1, 1, 1], vec![0.0f32]).unwrap();
        assert!(matches!(
            classify(Some(&HostData::Array(&cube)), &[]),
            Err(BridgeError::InvalidRank { expected: 2, got: 3 })
        ));
    }
}
