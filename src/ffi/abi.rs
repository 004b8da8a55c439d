//! C ABI Declarations
//!
//! Function pointer signatures and `#[repr(C)]` struct layouts matching
//! `gmt.h` / `gmt_resources.h` from GMT 6.

use std::ffi::{c_char, c_double, c_float, c_int, c_uint, c_void};

/// Value returned by `GMT_Get_Enum` for names it does not know.
pub const GMT_NOTSET: c_int = -99999;

/// Size of the buffer handed to `GMT_Get_Default`.
pub const DEFAULT_VALUE_LEN: usize = 10_000;

/// Optional print callback accepted by `GMT_Create_Session`.
pub type PrintFunc = Option<unsafe extern "C" fn(*mut c_void, *const c_char) -> c_int>;

// =============================================================================
// Entry point signatures
// =============================================================================

pub type CreateSessionFn =
    unsafe extern "C" fn(*const c_char, c_uint, c_uint, PrintFunc) -> *mut c_void;
pub type DestroySessionFn = unsafe extern "C" fn(*mut c_void) -> c_int;
pub type GetEnumFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> c_int;
pub type GetDefaultFn = unsafe extern "C" fn(*mut c_void, *const c_char, *mut c_char) -> c_int;
pub type CallModuleFn = unsafe extern "C" fn(*mut c_void, *const c_char, c_int, *mut c_void) -> c_int;
pub type HandleMessagesFn = unsafe extern "C" fn(*mut c_void, c_uint, c_uint, *mut c_void) -> c_int;
pub type CreateDataFn = unsafe extern "C" fn(
    *mut c_void,
    c_uint,
    c_uint,
    c_uint,
    *const u64,
    *const c_double,
    *const c_double,
    c_uint,
    c_int,
    *mut c_void,
) -> *mut c_void;
pub type DestroyDataFn = unsafe extern "C" fn(*mut c_void, *mut c_void) -> c_int;
pub type PutVectorFn = unsafe extern "C" fn(*mut c_void, *mut c_void, c_uint, c_uint, *mut c_void) -> c_int;
pub type PutMatrixFn = unsafe extern "C" fn(*mut c_void, *mut c_void, c_uint, c_int, *mut c_void) -> c_int;
pub type PutStringsFn = unsafe extern "C" fn(*mut c_void, c_uint, *mut c_void, *mut *mut c_char) -> c_int;
pub type OpenVirtualFileFn =
    unsafe extern "C" fn(*mut c_void, c_uint, c_uint, c_uint, *mut c_void, *mut c_char) -> c_int;
pub type CloseVirtualFileFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> c_int;
pub type ReadVirtualFileFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_void;

// =============================================================================
// Dataset layout
// =============================================================================

/// `struct GMT_DATASEGMENT`
#[repr(C)]
#[derive(Debug)]
pub struct GmtDataSegment {
    pub n_rows: u64,
    pub n_columns: u64,
    pub min: *mut c_double,
    pub max: *mut c_double,
    pub data: *mut *mut c_double,
    pub label: *mut c_char,
    pub header: *mut c_char,
    pub text: *mut *mut c_char,
    pub hidden: *mut c_void,
}

/// `struct GMT_DATATABLE`
#[repr(C)]
#[derive(Debug)]
pub struct GmtDataTable {
    pub n_headers: c_uint,
    pub n_columns: u64,
    pub n_segments: u64,
    pub n_records: u64,
    pub min: *mut c_double,
    pub max: *mut c_double,
    pub header: *mut *mut c_char,
    pub segment: *mut *mut GmtDataSegment,
    pub hidden: *mut c_void,
}

/// `struct GMT_DATASET`
#[repr(C)]
#[derive(Debug)]
pub struct GmtDataset {
    pub n_tables: u64,
    pub n_columns: u64,
    pub n_segments: u64,
    pub n_records: u64,
    pub min: *mut c_double,
    pub max: *mut c_double,
    pub table: *mut *mut GmtDataTable,
    pub type_: c_int,
    pub geometry: c_int,
    pub proj_ref_proj4: *mut c_char,
    pub proj_ref_wkt: *mut c_char,
    pub proj_ref_epsg: c_int,
    pub hidden: *mut c_void,
}

// =============================================================================
// Grid and image layout
// =============================================================================

pub const GRID_UNIT_LEN: usize = 80;
pub const GRID_TITLE_LEN: usize = 80;
pub const GRID_COMMAND_LEN: usize = 320;
pub const GRID_REMARK_LEN: usize = 160;

/// `struct GMT_GRID_HEADER`
#[repr(C)]
#[derive(Debug)]
pub struct GmtGridHeader {
    pub n_columns: u32,
    pub n_rows: u32,
    pub registration: u32,
    pub wesn: [c_double; 4],
    pub z_min: c_double,
    pub z_max: c_double,
    pub inc: [c_double; 2],
    pub z_scale_factor: c_double,
    pub z_add_offset: c_double,
    pub x_units: [c_char; GRID_UNIT_LEN],
    pub y_units: [c_char; GRID_UNIT_LEN],
    pub z_units: [c_char; GRID_UNIT_LEN],
    pub title: [c_char; GRID_TITLE_LEN],
    pub command: [c_char; GRID_COMMAND_LEN],
    pub remark: [c_char; GRID_REMARK_LEN],
    pub type_: u32,
    pub bits: u32,
    pub complex_mode: u32,
    pub mx: u32,
    pub my: u32,
    pub nm: usize,
    pub size: usize,
    pub n_alloc: usize,
    pub trendmode: u32,
    pub arrangement: u32,
    pub n_bands: u32,
    pub pad: [u32; 4],
    pub bc: [u32; 4],
    pub grdtype: u32,
    pub proj_ref_proj4: *mut c_char,
    pub proj_ref_wkt: *mut c_char,
    pub proj_ref_epsg: c_int,
    pub hidden: *mut c_void,
}

impl GmtGridHeader {
    /// A zeroed header with the given geometry.
    pub fn new(n_columns: u32, n_rows: u32, pad: [u32; 4]) -> Self {
        Self {
            n_columns,
            n_rows,
            registration: 0,
            wesn: [0.0; 4],
            z_min: 0.0,
            z_max: 0.0,
            inc: [0.0; 2],
            z_scale_factor: 1.0,
            z_add_offset: 0.0,
            x_units: [0; GRID_UNIT_LEN],
            y_units: [0; GRID_UNIT_LEN],
            z_units: [0; GRID_UNIT_LEN],
            title: [0; GRID_TITLE_LEN],
            command: [0; GRID_COMMAND_LEN],
            remark: [0; GRID_REMARK_LEN],
            type_: 0,
            bits: 32,
            complex_mode: 0,
            mx: n_columns + pad[0] + pad[1],
            my: n_rows + pad[2] + pad[3],
            nm: n_columns as usize * n_rows as usize,
            size: (n_columns + pad[0] + pad[1]) as usize * (n_rows + pad[2] + pad[3]) as usize,
            n_alloc: 0,
            trendmode: 0,
            arrangement: 0,
            n_bands: 1,
            pad,
            bc: [0; 4],
            grdtype: 0,
            proj_ref_proj4: std::ptr::null_mut(),
            proj_ref_wkt: std::ptr::null_mut(),
            proj_ref_epsg: 0,
            hidden: std::ptr::null_mut(),
        }
    }
}

/// `struct GMT_GRID`
#[repr(C)]
#[derive(Debug)]
pub struct GmtGrid {
    pub header: *mut GmtGridHeader,
    pub data: *mut c_float,
    pub x: *mut c_double,
    pub y: *mut c_double,
    pub hidden: *mut c_void,
}

/// `struct GMT_IMAGE`
#[repr(C)]
#[derive(Debug)]
pub struct GmtImage {
    pub type_: c_int,
    pub colormap: *mut c_int,
    pub n_indexed_colors: c_int,
    pub header: *mut GmtGridHeader,
    pub data: *mut u8,
    pub alpha: *mut u8,
    pub color_interp: *const c_char,
    pub x: *mut c_double,
    pub y: *mut c_double,
    pub hidden: *mut c_void,
}
