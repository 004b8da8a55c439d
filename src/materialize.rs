//! Result Materializer
//!
//! Reads native output containers back from an output virtual file into
//! owned host structures. Native memory stays with the library; everything
//! returned here is copied.

use std::ffi::{CStr, CString};

use ndarray::{Array2, Array3};
use tracing::debug;

use crate::data::{ColumnarTable, GridType, Raster, Registration, TypedBuffer};
use crate::error::{BridgeError, Result};
use crate::ffi::abi::{GmtDataset, GmtGrid, GmtGridHeader, GmtImage};
use crate::virtualfile::{OutputKind, VirtualFile};

impl VirtualFile<'_> {
    /// Read the native object a module wrote into this file.
    fn read_native(&self) -> Result<*mut std::ffi::c_void> {
        if !self.holds_output() || !self.is_open() {
            return Err(BridgeError::NotAnOutput(self.name().to_string()));
        }
        let session = self.session();
        let handle = session.handle()?;
        let name = CString::new(self.name()).map_err(|_| BridgeError::NotAnOutput(self.name().to_string()))?;
        // Safety: `name` was issued by this session and is still open.
        Ok(unsafe { session.api().read_virtualfile(handle, name.as_ptr()) })
    }

    /// Copy a tabular result out.
    ///
    /// Numeric columns come back as `f64` named `"0"`, `"1"`, ...; trailing
    /// text, when present, becomes a final text column. An empty result is
    /// `Ok(None)`, or `EmptyResult` when `required`.
    pub fn to_table(&self, required: bool) -> Result<Option<ColumnarTable>> {
        let ptr = self.read_native()?;
        let empty = || {
            if required {
                Err(BridgeError::EmptyResult(self.name().to_string()))
            } else {
                Ok(None)
            }
        };
        if ptr.is_null() {
            return empty();
        }

        // Safety: an output dataset file yields a GMT_DATASET owned by the
        // session; it is only read here.
        let dataset = unsafe { &*(ptr as *const GmtDataset) };
        let (columns, text) = unsafe { collect_records(dataset) };
        let n_rows = columns.first().map_or(text.len(), Vec::len);
        if n_rows == 0 {
            return empty();
        }

        let mut table = ColumnarTable::new();
        let n_columns = columns.len();
        for (index, values) in columns.into_iter().enumerate() {
            table.push(index.to_string(), TypedBuffer::from(values))?;
        }
        if text.iter().any(Option::is_some) {
            let text: Vec<String> = text.into_iter().map(Option::unwrap_or_default).collect();
            table.push(n_columns.to_string(), TypedBuffer::from(text))?;
        }
        debug!(vfile = %self.name(), n_rows, n_columns = table.n_columns(), "materialized table");
        Ok(Some(table))
    }

    /// Copy a grid or image out, rows ordered south to north.
    ///
    /// Registration and grid type come from the native grid header, not
    /// from a separate summary module call.
    pub fn to_raster(&self, kind: OutputKind) -> Result<Raster> {
        if kind == OutputKind::Table {
            return Err(BridgeError::InvalidArgument("to_raster needs a grid or image kind".to_string()));
        }
        let ptr = self.read_native()?;
        if ptr.is_null() {
            return Err(BridgeError::EmptyResult(self.name().to_string()));
        }

        // Safety: the pointer is a GMT_GRID or GMT_IMAGE per `kind`, owned by
        // the session and only read here.
        let raster = unsafe {
            match kind {
                OutputKind::Grid => read_grid(&*(ptr as *const GmtGrid)),
                _ => read_image(&*(ptr as *const GmtImage)),
            }
        }
        .ok_or_else(|| BridgeError::EmptyResult(self.name().to_string()))?;
        debug!(
            vfile = %self.name(),
            n_columns = raster.n_columns(),
            n_rows = raster.n_rows(),
            bands = raster.n_bands(),
            "materialized raster"
        );
        Ok(raster)
    }
}

/// Concatenate every segment of every table.
///
/// # Safety
///
/// `dataset` must be a well-formed GMT_DATASET.
unsafe fn collect_records(dataset: &GmtDataset) -> (Vec<Vec<f64>>, Vec<Option<String>>) {
    let n_columns = dataset.n_columns as usize;
    let mut columns = vec![Vec::new(); n_columns];
    let mut text = Vec::new();

    for t in 0..dataset.n_tables as usize {
        let table = &**dataset.table.add(t);
        for s in 0..table.n_segments as usize {
            let segment = &**table.segment.add(s);
            let n_rows = segment.n_rows as usize;
            for (c, column) in columns.iter_mut().enumerate() {
                if c < segment.n_columns as usize && !segment.data.is_null() {
                    let values = *segment.data.add(c);
                    column.extend_from_slice(std::slice::from_raw_parts(values, n_rows));
                } else {
                    column.extend(std::iter::repeat(f64::NAN).take(n_rows));
                }
            }
            for row in 0..n_rows {
                let line = if segment.text.is_null() {
                    None
                } else {
                    let ptr = *segment.text.add(row);
                    (!ptr.is_null()).then(|| CStr::from_ptr(ptr).to_string_lossy().into_owned())
                };
                text.push(line);
            }
        }
    }
    (columns, text)
}

/// Node coordinates along one axis.
fn coordinates(min: f64, inc: f64, n: usize, registration: Registration) -> Vec<f64> {
    let offset = match registration {
        Registration::Gridline => 0.0,
        Registration::Pixel => inc / 2.0,
    };
    (0..n).map(|i| min + offset + i as f64 * inc).collect()
}

/// Strip the pad of band `band` and flip it so row 0 is the southernmost.
///
/// # Safety
///
/// `data` must hold `n_bands * mx * my` values laid out per `header`.
unsafe fn unpad<T: Copy>(header: &GmtGridHeader, data: *const T, band: usize) -> Vec<T> {
    let (nx, ny) = (header.n_columns as usize, header.n_rows as usize);
    let (mx, my) = (header.mx as usize, header.my as usize);
    let [west, _, _, north] = header.pad.map(|p| p as usize);
    let plane = std::slice::from_raw_parts(data.add(band * mx * my), mx * my);
    let mut values = Vec::with_capacity(nx * ny);
    for row in (0..ny).rev() {
        let start = (row + north) * mx + west;
        values.extend_from_slice(&plane[start..start + nx]);
    }
    values
}

fn axes(header: &GmtGridHeader) -> (Vec<f64>, Vec<f64>, Registration, GridType) {
    let registration = Registration::from_code(header.registration);
    let [w, _, s, _] = header.wesn;
    let x = coordinates(w, header.inc[0], header.n_columns as usize, registration);
    let y = coordinates(s, header.inc[1], header.n_rows as usize, registration);
    (x, y, registration, GridType::from_code(header.grdtype))
}

/// # Safety
///
/// `grid` must be a well-formed GMT_GRID.
unsafe fn read_grid(grid: &GmtGrid) -> Option<Raster> {
    if grid.header.is_null() || grid.data.is_null() {
        return None;
    }
    let header = &*grid.header;
    let values = unpad(header, grid.data, 0);
    let (x, y, registration, gtype) = axes(header);
    let data = Array2::from_shape_vec((y.len(), x.len()), values).ok()?;
    Raster::grid(data, x, y)
        .ok()
        .map(|r| r.with_registration(registration).with_gtype(gtype))
}

/// # Safety
///
/// `image` must be a well-formed GMT_IMAGE with band-sequential data.
unsafe fn read_image(image: &GmtImage) -> Option<Raster> {
    if image.header.is_null() || image.data.is_null() {
        return None;
    }
    let header = &*image.header;
    let n_bands = header.n_bands.max(1) as usize;
    let values: Vec<u8> = (0..n_bands).flat_map(|b| unpad(header, image.data, b)).collect();
    let (x, y, registration, gtype) = axes(header);
    let data = Array3::from_shape_vec((n_bands, y.len(), x.len()), values).ok()?;
    Raster::image(data, x, y)
        .ok()
        .map(|r| r.with_registration(registration).with_gtype(gtype))
}
