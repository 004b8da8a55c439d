//! Constant table of the in-memory engine, using GMT 6 values.

use std::ffi::c_int;

use crate::ffi::abi::GMT_NOTSET;

pub(super) const DATASET: u32 = 0;
pub(super) const GRID: u32 = 1;
pub(super) const IMAGE: u32 = 2;
pub(super) const MATRIX: u32 = 5;
pub(super) const VECTOR: u32 = 6;
pub(super) const VIA_VECTOR: u32 = 100;
pub(super) const VIA_MATRIX: u32 = 200;

pub(super) const OUT: u32 = 1;
pub(super) const IS_DUPLICATE: u32 = 16;
pub(super) const IS_REFERENCE: u32 = 32;
pub(super) const IS_OUTPUT: u32 = 1024;
pub(super) const GRID_IS_GEO: u32 = 4;

pub(super) const TEXT: u32 = 16;

pub(super) const LOG_OFF: u32 = 0;
pub(super) const LOG_ONCE: u32 = 1;
pub(super) const IS_FILE: u32 = 0;

pub(super) const MODULE_CMD: c_int = 0;
pub(super) const PAD_DEFAULT: u32 = 2;
pub(super) const VF_LEN: usize = 32;

const TABLE: &[(&str, c_int)] = &[
    // families
    ("GMT_IS_DATASET", DATASET as c_int),
    ("GMT_IS_GRID", GRID as c_int),
    ("GMT_IS_IMAGE", IMAGE as c_int),
    ("GMT_IS_PALETTE", 3),
    ("GMT_IS_POSTSCRIPT", 4),
    ("GMT_IS_MATRIX", MATRIX as c_int),
    ("GMT_IS_VECTOR", VECTOR as c_int),
    ("GMT_IS_CUBE", 7),
    ("GMT_VIA_VECTOR", VIA_VECTOR as c_int),
    ("GMT_VIA_MATRIX", VIA_MATRIX as c_int),
    // geometries
    ("GMT_IS_POINT", 1),
    ("GMT_IS_LINE", 2),
    ("GMT_IS_POLY", 4),
    ("GMT_IS_PLP", 7),
    ("GMT_IS_SURFACE", 8),
    ("GMT_IS_NONE", 16),
    // creation modes and methods
    ("GMT_CONTAINER_AND_DATA", 0),
    ("GMT_CONTAINER_ONLY", 1),
    ("GMT_IS_OUTPUT", IS_OUTPUT as c_int),
    ("GMT_GRID_IS_CARTESIAN", 0),
    ("GMT_GRID_IS_GEO", GRID_IS_GEO as c_int),
    ("GMT_IS_FILE", IS_FILE as c_int),
    ("GMT_IS_DUPLICATE", IS_DUPLICATE as c_int),
    ("GMT_IS_REFERENCE", IS_REFERENCE as c_int),
    // directions
    ("GMT_IN", 0),
    ("GMT_OUT", OUT as c_int),
    // registrations
    ("GMT_GRID_NODE_REG", 0),
    ("GMT_GRID_PIXEL_REG", 1),
    // element types
    ("GMT_CHAR", 0),
    ("GMT_UCHAR", 1),
    ("GMT_SHORT", 2),
    ("GMT_USHORT", 3),
    ("GMT_INT", 4),
    ("GMT_UINT", 5),
    ("GMT_LONG", 6),
    ("GMT_ULONG", 7),
    ("GMT_FLOAT", 8),
    ("GMT_DOUBLE", 9),
    ("GMT_TEXT", TEXT as c_int),
    // session
    ("GMT_SESSION_EXTERNAL", 2),
    ("GMT_PAD_DEFAULT", PAD_DEFAULT as c_int),
    ("GMT_VF_LEN", VF_LEN as c_int),
    ("GMT_MODULE_CMD", MODULE_CMD),
    ("GMT_LOG_OFF", LOG_OFF as c_int),
    ("GMT_LOG_ONCE", LOG_ONCE as c_int),
];

/// Value of `name`, or `GMT_NOTSET`.
pub(super) fn lookup(name: &str) -> c_int {
    TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map_or(GMT_NOTSET, |&(_, v)| v)
}
