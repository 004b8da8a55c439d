//! Host Data
//!
//! Host-side structures exchanged with native containers: typed buffers,
//! columnar tables, rasters, and the classification of caller payloads.

mod buffer;
mod kind;
mod raster;
mod table;

pub use buffer::{Element, TypedBuffer};
pub use kind::{classify, DataKind, HostData};
pub use raster::{GridType, Raster, RasterData, Registration};
pub use table::{Column, ColumnarTable};
