//! Objects held by the in-memory engine and their native layouts.

use std::ffi::{c_char, c_void, CStr, CString};

use crate::ffi::abi::{GmtDataSegment, GmtDataTable, GmtDataset, GmtGrid, GmtGridHeader, GmtImage};

use super::constants::TEXT;

/// One column handed over through `GMT_Put_Vector`
#[derive(Debug, Clone)]
pub(super) enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

/// Raster geometry as given to `GMT_Create_Data`
#[derive(Debug, Clone, PartialEq)]
pub(super) struct GridMeta {
    pub n_columns: usize,
    pub n_rows: usize,
    pub wesn: [f64; 4],
    pub inc: [f64; 2],
    pub registration: u32,
    pub grdtype: u32,
}

impl GridMeta {
    pub fn from_region(wesn: [f64; 4], inc: [f64; 2], registration: u32, grdtype: u32) -> Self {
        let nodes = |min: f64, max: f64, d: f64| {
            if d <= 0.0 || max < min {
                return 0;
            }
            let cells = ((max - min) / d).round() as usize;
            if registration == 1 {
                cells
            } else {
                cells + 1
            }
        };
        Self {
            n_columns: nodes(wesn[0], wesn[1], inc[0]),
            n_rows: nodes(wesn[2], wesn[3], inc[1]),
            wesn,
            inc,
            registration,
            grdtype,
        }
    }

    pub fn nodes(&self) -> usize {
        self.n_columns * self.n_rows
    }
}

/// A container created through `GMT_Create_Data`
#[derive(Debug)]
pub(super) enum FakeObject {
    Vectors {
        n_rows: usize,
        columns: Vec<Option<Column>>,
        text: Option<Vec<String>>,
    },
    Matrix {
        n_rows: usize,
        n_columns: usize,
        values: Option<Vec<f64>>,
        text: Option<Vec<String>>,
    },
    Grid {
        meta: GridMeta,
        /// North row first
        values: Option<Vec<f32>>,
    },
    Image {
        meta: GridMeta,
        n_bands: usize,
        /// Band-sequential, north row first
        values: Option<Vec<u8>>,
    },
    Output,
}

impl FakeObject {
    /// Contents as a module sees them.
    pub fn to_payload(&self) -> Result<Payload, String> {
        match self {
            FakeObject::Vectors { n_rows, columns, text } => {
                let mut numeric = Vec::new();
                let mut row_text: Vec<Vec<String>> = vec![Vec::new(); *n_rows];
                for (index, column) in columns.iter().enumerate() {
                    match column {
                        Some(Column::Numeric(values)) => numeric.push(values.clone()),
                        Some(Column::Text(values)) => {
                            for (row, value) in row_text.iter_mut().zip(values) {
                                row.push(value.clone());
                            }
                        }
                        None => return Err(format!("column {} was never set", index)),
                    }
                }
                if let Some(text) = text {
                    for (row, value) in row_text.iter_mut().zip(text) {
                        row.push(value.clone());
                    }
                }
                let has_text = row_text.iter().any(|r| !r.is_empty());
                Ok(Payload::Table(TablePayload {
                    columns: numeric,
                    text: has_text.then(|| row_text.into_iter().map(|r| r.join(" ")).collect()),
                }))
            }
            FakeObject::Matrix {
                n_rows,
                n_columns,
                values,
                text,
            } => {
                let values = values.as_ref().ok_or("matrix was never set")?;
                let columns = (0..*n_columns)
                    .map(|c| (0..*n_rows).map(|r| values[r * n_columns + c]).collect())
                    .collect();
                Ok(Payload::Table(TablePayload {
                    columns,
                    text: text.clone(),
                }))
            }
            FakeObject::Grid { meta, values } => Ok(Payload::Grid(GridPayload {
                meta: meta.clone(),
                values: values.clone().ok_or("grid values were never set")?,
            })),
            FakeObject::Image { meta, n_bands, values } => Ok(Payload::Image(ImagePayload {
                meta: meta.clone(),
                n_bands: *n_bands,
                values: values.clone().ok_or("image values were never set")?,
            })),
            FakeObject::Output => Err("output container used as input".to_string()),
        }
    }
}

/// Tabular data: numeric columns plus optional trailing text
#[derive(Debug, Clone, PartialEq)]
pub(super) struct TablePayload {
    pub columns: Vec<Vec<f64>>,
    pub text: Option<Vec<String>>,
}

impl TablePayload {
    pub fn n_rows(&self) -> usize {
        self.columns
            .first()
            .map(Vec::len)
            .or_else(|| self.text.as_ref().map(Vec::len))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct GridPayload {
    pub meta: GridMeta,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ImagePayload {
    pub meta: GridMeta,
    pub n_bands: usize,
    pub values: Vec<u8>,
}

/// Data flowing between modules, files and virtual files
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Payload {
    Table(TablePayload),
    Grid(GridPayload),
    Image(ImagePayload),
}

/// Read `n` values of GMT type `type_code` from `ptr`.
///
/// # Safety
///
/// `ptr` must point at `n` elements of the given type, or at `n` C strings
/// for `GMT_TEXT`.
pub(super) unsafe fn read_column(ptr: *const c_void, type_code: u32, n: usize) -> Option<Column> {
    if n == 0 {
        return Some(if type_code == TEXT {
            Column::Text(Vec::new())
        } else {
            Column::Numeric(Vec::new())
        });
    }
    if ptr.is_null() {
        return None;
    }
    macro_rules! numeric {
        ($t:ty) => {
            std::slice::from_raw_parts(ptr as *const $t, n)
                .iter()
                .map(|&v| v as f64)
                .collect()
        };
    }
    let values: Vec<f64> = match type_code {
        0 => numeric!(i8),
        1 => numeric!(u8),
        2 => numeric!(i16),
        3 => numeric!(u16),
        4 => numeric!(i32),
        5 => numeric!(u32),
        6 => numeric!(i64),
        7 => numeric!(u64),
        8 => numeric!(f32),
        9 => numeric!(f64),
        TEXT => return Some(Column::Text(read_strings(ptr as *const *const c_char, n))),
        _ => return None,
    };
    Some(Column::Numeric(values))
}

/// # Safety
///
/// `ptr` must point at `n` NUL-terminated strings.
pub(super) unsafe fn read_strings(ptr: *const *const c_char, n: usize) -> Vec<String> {
    std::slice::from_raw_parts(ptr, n)
        .iter()
        .map(|&s| {
            if s.is_null() {
                String::new()
            } else {
                CStr::from_ptr(s).to_string_lossy().into_owned()
            }
        })
        .collect()
}

// =============================================================================
// Native layouts handed back by GMT_Read_VirtualFile
// =============================================================================

/// Padding applied to grids handed back to callers, `[W, E, S, N]`
pub(super) const GRID_PAD: [u32; 4] = [2, 2, 2, 2];

/// A native object plus every allocation it points into
pub(super) enum Native {
    Dataset(NativeDataset),
    Grid(NativeGrid),
    Image(NativeImage),
}

impl Native {
    pub fn build(payload: &Payload) -> Self {
        match payload {
            Payload::Table(t) => Native::Dataset(NativeDataset::new(t)),
            Payload::Grid(g) => Native::Grid(NativeGrid::new(g)),
            Payload::Image(i) => Native::Image(NativeImage::new(i)),
        }
    }

    pub fn as_ptr(&mut self) -> *mut c_void {
        match self {
            Native::Dataset(d) => (&mut *d.dataset as *mut GmtDataset).cast(),
            Native::Grid(g) => (&mut *g.grid as *mut GmtGrid).cast(),
            Native::Image(i) => (&mut *i.image as *mut GmtImage).cast(),
        }
    }
}

pub(super) struct NativeDataset {
    dataset: Box<GmtDataset>,
    _tables: Vec<*mut GmtDataTable>,
    _table: Box<GmtDataTable>,
    _segments: Vec<*mut GmtDataSegment>,
    _segment: Box<GmtDataSegment>,
    _columns: Vec<Vec<f64>>,
    _column_ptrs: Vec<*mut f64>,
    _text: Vec<CString>,
    _text_ptrs: Vec<*mut c_char>,
}

impl NativeDataset {
    fn new(table: &TablePayload) -> Self {
        let n_rows = table.n_rows() as u64;
        let n_columns = table.columns.len() as u64;

        let mut columns = table.columns.clone();
        let mut column_ptrs: Vec<*mut f64> = columns.iter_mut().map(|c| c.as_mut_ptr()).collect();
        let text: Vec<CString> = table
            .text
            .iter()
            .flatten()
            .map(|s| CString::new(s.replace('\0', " ")).unwrap_or_default())
            .collect();
        let mut text_ptrs: Vec<*mut c_char> = text.iter().map(|s| s.as_ptr() as *mut c_char).collect();

        let mut segment = Box::new(GmtDataSegment {
            n_rows,
            n_columns,
            min: std::ptr::null_mut(),
            max: std::ptr::null_mut(),
            data: column_ptrs.as_mut_ptr(),
            label: std::ptr::null_mut(),
            header: std::ptr::null_mut(),
            text: if table.text.is_some() {
                text_ptrs.as_mut_ptr()
            } else {
                std::ptr::null_mut()
            },
            hidden: std::ptr::null_mut(),
        });
        let mut segments = vec![&mut *segment as *mut GmtDataSegment];
        let mut data_table = Box::new(GmtDataTable {
            n_headers: 0,
            n_columns,
            n_segments: 1,
            n_records: n_rows,
            min: std::ptr::null_mut(),
            max: std::ptr::null_mut(),
            header: std::ptr::null_mut(),
            segment: segments.as_mut_ptr(),
            hidden: std::ptr::null_mut(),
        });
        let mut tables = vec![&mut *data_table as *mut GmtDataTable];
        let dataset = Box::new(GmtDataset {
            n_tables: 1,
            n_columns,
            n_segments: 1,
            n_records: n_rows,
            min: std::ptr::null_mut(),
            max: std::ptr::null_mut(),
            table: tables.as_mut_ptr(),
            type_: 0,
            geometry: 0,
            proj_ref_proj4: std::ptr::null_mut(),
            proj_ref_wkt: std::ptr::null_mut(),
            proj_ref_epsg: 0,
            hidden: std::ptr::null_mut(),
        });

        Self {
            dataset,
            _tables: tables,
            _table: data_table,
            _segments: segments,
            _segment: segment,
            _columns: columns,
            _column_ptrs: column_ptrs,
            _text: text,
            _text_ptrs: text_ptrs,
        }
    }
}

fn header(meta: &GridMeta, pad: [u32; 4], n_bands: usize) -> Box<GmtGridHeader> {
    let mut header = Box::new(GmtGridHeader::new(meta.n_columns as u32, meta.n_rows as u32, pad));
    header.registration = meta.registration;
    header.wesn = meta.wesn;
    header.inc = meta.inc;
    header.grdtype = meta.grdtype;
    header.n_bands = n_bands as u32;
    header
}

pub(super) struct NativeGrid {
    grid: Box<GmtGrid>,
    _header: Box<GmtGridHeader>,
    _data: Vec<f32>,
}

impl NativeGrid {
    fn new(payload: &GridPayload) -> Self {
        let meta = &payload.meta;
        let mut header = header(meta, GRID_PAD, 1);
        let [w, _, _, n] = GRID_PAD.map(|p| p as usize);
        let mx = header.mx as usize;
        let mut data = vec![f32::NAN; header.size];
        for row in 0..meta.n_rows {
            for col in 0..meta.n_columns {
                data[(row + n) * mx + col + w] = payload.values[row * meta.n_columns + col];
            }
        }
        header.z_min = payload.values.iter().copied().fold(f32::INFINITY, f32::min) as f64;
        header.z_max = payload.values.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        let grid = Box::new(GmtGrid {
            header: &mut *header,
            data: data.as_mut_ptr(),
            x: std::ptr::null_mut(),
            y: std::ptr::null_mut(),
            hidden: std::ptr::null_mut(),
        });
        Self {
            grid,
            _header: header,
            _data: data,
        }
    }
}

pub(super) struct NativeImage {
    image: Box<GmtImage>,
    _header: Box<GmtGridHeader>,
    _data: Vec<u8>,
}

impl NativeImage {
    fn new(payload: &ImagePayload) -> Self {
        let mut header = header(&payload.meta, [0; 4], payload.n_bands);
        let mut data = payload.values.clone();
        let image = Box::new(GmtImage {
            type_: 1,
            colormap: std::ptr::null_mut(),
            n_indexed_colors: 0,
            header: &mut *header,
            data: data.as_mut_ptr(),
            alpha: std::ptr::null_mut(),
            color_interp: std::ptr::null_mut(),
            x: std::ptr::null_mut(),
            y: std::ptr::null_mut(),
            hidden: std::ptr::null_mut(),
        });
        Self {
            image,
            _header: header,
            _data: data,
        }
    }
}
