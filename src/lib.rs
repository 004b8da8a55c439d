//! gmt-clib - Native bridge to the GMT C API
//!
//! Loads `libgmt` at runtime and exposes its session, data-container and
//! virtual-file machinery through ownership-typed Rust values. Host data
//! goes in as typed buffers, tables and rasters; module results come back
//! as owned copies.
//!
//! # Features
//!
//! - **Runtime loading**: finds `libgmt` through `GMT_LIBRARY_PATH`,
//!   `gmt --show-library`, configured directories or the system search path
//! - **Sessions**: explicit `Unopened -> Active -> Closed` lifecycle with
//!   per-session constant caching
//! - **Containers**: validated family/geometry/mode strings, copied ingestion
//! - **Virtual files**: library-issued names with stale-name detection
//! - **Materialization**: datasets, grids and images back into host values
//! - **In-memory engine** (`fake` feature): a `NativeApi` stand-in with
//!   per-entry-point call counts, for tests that run without `libgmt`
//!
//! # Example
//!
//! ```no_run
//! use gmt_clib::{with_session, LibraryLoader, OutputKind, TypedBuffer};
//!
//! let library = LibraryLoader::new().load()?;
//! let x = TypedBuffer::from(vec![1.0f64, 2.0, 3.0]);
//! let y = TypedBuffer::from(vec![4i32, 5, 6]);
//!
//! let table = with_session(library, "example", |session| {
//!     let input = session.virtualfile_in(None, &[&x, &y], false)?;
//!     let output = session.virtualfile_out(OutputKind::Table, None)?;
//!     session.call_module("write", format!("{} ->{}", input, output))?;
//!     output.to_table(true)
//! })?
//! .expect("required result");
//!
//! assert_eq!(table.n_rows(), 3);
//! assert_eq!(table.n_columns(), 2);
//! # Ok::<(), gmt_clib::BridgeError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Session (lifecycle, constants, names)│
//! └──────┬──────────────┬────────────────┘
//!        │              │
//!        ▼              ▼
//! ┌────────────┐  ┌─────────────┐   ┌──────────────┐
//! │ Container  │─▶│ VirtualFile │──▶│ call_module  │
//! │ + ingestion│  │  in / out   │   └──────┬───────┘
//! └────────────┘  └──────┬──────┘          │
//!                        ▼                 ▼
//!                 ┌─────────────┐   ┌──────────────┐
//!                 │ materialize │   │  NativeApi   │  libgmt or FakeEngine
//!                 └─────────────┘   └──────────────┘
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod container;
pub mod data;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod ffi;
pub mod invoke;
pub mod materialize;
pub mod session;
pub mod virtualfile;

// Re-export commonly used types
pub use config::{BridgeConfig, ConfigError, LibraryConfig, SessionConfig};
pub use container::{Container, DataFamily, DataRequest, Extent, Geometry};
pub use data::{
    classify, Column, ColumnarTable, DataKind, GridType, HostData, Raster, RasterData, Registration,
    TypedBuffer,
};
pub use error::{BridgeError, Result};
pub use ffi::{ElementKind, LibGmt, LibraryLoader, NativeApi};
pub use invoke::ModuleArgs;
pub use session::{with_session, LibraryInfo, Session, SessionState};
pub use virtualfile::{Direction, OutputKind, VirtualFile};
