//! Input virtual files built from host data.

use ndarray::s;
use tracing::debug;

use crate::container::{check_exact, DataRequest};
use crate::data::{classify, DataKind, GridType, HostData, Raster, RasterData, TypedBuffer};
use crate::error::{BridgeError, Result};
use crate::session::Session;

use super::{Direction, VirtualFile};

const IN_REFERENCE: &str = "GMT_IN|GMT_IS_REFERENCE";

impl Session {
    /// Turn host data into something a module can read.
    ///
    /// `data` and `vectors` are mutually exclusive. With `required_z`, tabular
    /// input must carry at least three columns (x, y, z).
    pub fn virtualfile_in<'s>(
        &'s self,
        data: Option<HostData<'_>>,
        vectors: &[&TypedBuffer],
        required_z: bool,
    ) -> Result<VirtualFile<'s>> {
        self.handle()?;
        let kind = classify(data.as_ref(), vectors)?;
        debug!(?kind, "building input virtual file");

        match (kind, data) {
            (DataKind::File, Some(HostData::Path(path))) => {
                Ok(VirtualFile::passthrough(self, path, Direction::In))
            }
            (DataKind::Vectors, Some(HostData::Table(table))) => {
                let columns: Vec<&TypedBuffer> = table.columns().iter().map(|c| &c.data).collect();
                self.vectors_file(&columns, required_z)
            }
            (DataKind::Vectors, Some(HostData::Array(column))) => self.vectors_file(&[column], required_z),
            (DataKind::Empty, None) => self.vectors_file(vectors, required_z),
            (DataKind::Matrix, Some(HostData::Array(matrix))) => self.matrix_file(matrix, required_z),
            (DataKind::Grid | DataKind::Image, Some(HostData::Raster(raster))) => self.raster_file(raster),
            (kind, _) => Err(BridgeError::InvalidArgument(format!(
                "cannot build a {:?} virtual file from this input",
                kind
            ))),
        }
    }

    /// Numeric columns become vectors; text columns are joined into trailing text.
    fn vectors_file<'s>(&'s self, columns: &[&TypedBuffer], required_z: bool) -> Result<VirtualFile<'s>> {
        check_z(columns.len(), required_z)?;
        let n_rows = columns.first().map_or(0, |c| c.len());
        for column in columns {
            if column.ndim() != 1 {
                return Err(BridgeError::InvalidRank {
                    expected: 1,
                    got: column.ndim(),
                });
            }
            if column.len() != n_rows {
                return Err(BridgeError::ShapeMismatch {
                    expected: format!("{} rows", n_rows),
                    got: format!("{} rows", column.len()),
                });
            }
            if column.kind().gmt_type().is_none() {
                return Err(BridgeError::UnsupportedDType(column.kind().to_string()));
            }
            check_exact(column)?;
        }

        let (text, numeric): (Vec<&TypedBuffer>, Vec<&TypedBuffer>) =
            columns.iter().copied().partition(|c| c.as_text().is_some());

        let family = "GMT_IS_DATASET|GMT_VIA_VECTOR";
        let request = DataRequest::new(family, "GMT_IS_POINT", "GMT_CONTAINER_ONLY").dims(numeric.len(), n_rows);
        let container = self.create_data(&request)?;
        for (index, column) in numeric.iter().enumerate() {
            container.put_vector(index, column)?;
        }
        if !text.is_empty() {
            let texts: Vec<Vec<&str>> = text.iter().filter_map(|c| c.as_text()).collect();
            let rows: Vec<String> = (0..n_rows)
                .map(|row| texts.iter().map(|t| t[row]).collect::<Vec<_>>().join(" "))
                .collect();
            container.put_strings(&rows)?;
        }
        self.open_virtualfile(family, "GMT_IS_POINT", IN_REFERENCE, Some(container))
    }

    fn matrix_file<'s>(&'s self, matrix: &TypedBuffer, required_z: bool) -> Result<VirtualFile<'s>> {
        let (rows, cols) = match matrix.shape() {
            &[rows, cols] => (rows, cols),
            shape => {
                return Err(BridgeError::InvalidRank {
                    expected: 2,
                    got: shape.len(),
                })
            }
        };
        check_z(cols, required_z)?;
        if !matrix.kind().is_numeric() {
            return Err(BridgeError::UnsupportedDType(matrix.kind().to_string()));
        }
        check_exact(matrix)?;

        let family = "GMT_IS_DATASET|GMT_VIA_MATRIX";
        let request = DataRequest::new(family, "GMT_IS_POINT", "GMT_CONTAINER_ONLY").dims(cols, rows);
        let container = self.create_data(&request)?;
        container.put_matrix(matrix, 0)?;
        self.open_virtualfile(family, "GMT_IS_POINT", IN_REFERENCE, Some(container))
    }

    /// Rows are handed over north first, the library's storage order.
    fn raster_file<'s>(&'s self, raster: &Raster) -> Result<VirtualFile<'s>> {
        let mode = match raster.gtype {
            GridType::Cartesian => "GMT_CONTAINER_ONLY",
            GridType::Geographic => "GMT_CONTAINER_ONLY|GMT_GRID_IS_GEO",
        };
        let (family, values) = match &raster.data {
            RasterData::Grid(values) => (
                "GMT_IS_GRID|GMT_VIA_MATRIX",
                TypedBuffer::from(values.slice(s![..;-1, ..]).to_owned().into_dyn()),
            ),
            RasterData::Image(values) => (
                "GMT_IS_IMAGE|GMT_VIA_MATRIX",
                TypedBuffer::from(values.slice(s![.., ..;-1, ..]).to_owned().into_dyn()),
            ),
        };
        let request = DataRequest::new(family, "GMT_IS_SURFACE", mode)
            .region(raster.region()?, raster.increment()?)
            .bands(raster.n_bands())
            .registration(raster.registration);
        let container = self.create_data(&request)?;
        container.put_matrix(&values, 0)?;
        self.open_virtualfile(family, "GMT_IS_SURFACE", IN_REFERENCE, Some(container))
    }
}

fn check_z(n_columns: usize, required_z: bool) -> Result<()> {
    if required_z && n_columns < 3 {
        return Err(BridgeError::ShapeMismatch {
            expected: "at least 3 columns (x, y, z)".to_string(),
            got: format!("{} columns", n_columns),
        });
    }
    Ok(())
}
