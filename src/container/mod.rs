//! Container Factory
//!
//! Allocates native data containers through `GMT_Create_Data`. The family,
//! geometry and mode strings are validated locally before any native call,
//! so a typo never reaches the library.
//!
//! A [`Container`] borrows its session. It is destroyed when dropped, unless
//! the session has already been closed, in which case the library reclaimed
//! it together with the session.

mod family;
mod ingest;

use std::any::Any;
use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_uint, c_void, CString};
use std::fmt;

use tracing::{debug, warn};

use crate::data::Registration;
use crate::error::{BridgeError, Result};
use crate::session::Session;

pub use family::{BaseFamily, CreateMode, DataFamily, Geometry, ModeKind, Via};
pub(crate) use ingest::check_exact;
pub use ingest::MAX_EXACT_INTEGER;

/// Size of a new container
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    /// Columns and rows, for datasets, vectors and matrices
    Dims { n_columns: usize, n_rows: usize },
    /// Region `[w, e, s, n]` and spacing `[dx, dy]`, for grids and images
    Region {
        range: [f64; 4],
        inc: [f64; 2],
        n_bands: usize,
    },
}

/// Everything `GMT_Create_Data` needs
#[derive(Debug, Clone)]
pub struct DataRequest<'a> {
    pub family: &'a str,
    pub geometry: &'a str,
    pub mode: &'a str,
    pub extent: Option<Extent>,
    pub registration: Registration,
    /// Overrides the family's default padding
    pub pad: Option<c_int>,
}

impl<'a> DataRequest<'a> {
    pub fn new(family: &'a str, geometry: &'a str, mode: &'a str) -> Self {
        Self {
            family,
            geometry,
            mode,
            extent: None,
            registration: Registration::Gridline,
            pad: None,
        }
    }

    pub fn dims(mut self, n_columns: usize, n_rows: usize) -> Self {
        self.extent = Some(Extent::Dims { n_columns, n_rows });
        self
    }

    pub fn region(mut self, range: [f64; 4], inc: [f64; 2]) -> Self {
        self.extent = Some(Extent::Region {
            range,
            inc,
            n_bands: 1,
        });
        self
    }

    pub fn bands(mut self, n: usize) -> Self {
        if let Some(Extent::Region { n_bands, .. }) = &mut self.extent {
            *n_bands = n;
        }
        self
    }

    pub fn registration(mut self, registration: Registration) -> Self {
        self.registration = registration;
        self
    }

    pub fn pad(mut self, pad: c_int) -> Self {
        self.pad = Some(pad);
        self
    }
}

/// Host memory a native container references
pub(crate) enum Retained {
    Values { _values: Box<dyn Any> },
    Text {
        _owned: Vec<CString>,
        _pointers: Vec<*mut c_char>,
    },
}

/// A native data container owned by a session
pub struct Container<'s> {
    session: &'s Session,
    ptr: *mut c_void,
    family: DataFamily,
    geometry: Geometry,
    n_columns: usize,
    n_rows: usize,
    n_bands: usize,
    /// Must outlive `ptr`; dropped after the native container
    retained: RefCell<Vec<Retained>>,
}

impl Session {
    /// Allocate a native container.
    pub fn create_data(&self, request: &DataRequest<'_>) -> Result<Container<'_>> {
        let handle = self.handle()?;
        let family = DataFamily::parse(request.family)?;
        let geometry = Geometry::parse(request.geometry)?;
        let mode = CreateMode::parse(request.mode)?;

        let family_code = family.resolve(self)?;
        let geometry_code = geometry.resolve(self)?;
        let mode_code = mode.resolve(self)?;
        let registration = self.constant(request.registration.constant())?;
        let pad = match request.pad {
            Some(pad) => pad,
            None if family.is_matrix_backed() => 0,
            None => self.constant("GMT_PAD_DEFAULT")?,
        };

        let (mut dim, mut range, mut inc) = (None, None, None);
        let (n_columns, n_rows, n_bands) = match request.extent {
            Some(Extent::Dims { n_columns, n_rows }) => {
                dim = Some([n_columns as u64, n_rows as u64, 1, 0]);
                (n_columns, n_rows, 1)
            }
            Some(Extent::Region {
                range: wesn,
                inc: spacing,
                n_bands,
            }) => {
                range = Some(wesn);
                inc = Some(spacing);
                if n_bands > 1 {
                    dim = Some([0, 0, n_bands as u64, 0]);
                }
                let cols = nodes(wesn[0], wesn[1], spacing[0], request.registration);
                let rows = nodes(wesn[2], wesn[3], spacing[1], request.registration);
                (cols, rows, n_bands)
            }
            None => (0, 0, 1),
        };

        // Safety: the optional arrays live until the call returns; absent
        // ones are passed as null, which GMT reads as "not given".
        let ptr = unsafe {
            self.api().create_data(
                handle,
                family_code as c_uint,
                geometry_code as c_uint,
                mode_code as c_uint,
                dim.as_ref().map_or(std::ptr::null(), |d| d.as_ptr()),
                range.as_ref().map_or(std::ptr::null(), |r| r.as_ptr()),
                inc.as_ref().map_or(std::ptr::null(), |i| i.as_ptr()),
                registration as c_uint,
                pad,
                std::ptr::null_mut(),
            )
        };
        if ptr.is_null() {
            return Err(BridgeError::ContainerCreateFailed {
                family: family.to_string(),
            });
        }
        debug!(%family, n_columns, n_rows, "created container");

        Ok(Container {
            session: self,
            ptr,
            family,
            geometry,
            n_columns,
            n_rows,
            n_bands,
            retained: RefCell::new(Vec::new()),
        })
    }
}

/// Number of nodes along one axis of a region.
fn nodes(min: f64, max: f64, inc: f64, registration: Registration) -> usize {
    if inc <= 0.0 || max < min {
        return 0;
    }
    let cells = ((max - min) / inc).round() as usize;
    match registration {
        Registration::Gridline => cells + 1,
        Registration::Pixel => cells,
    }
}

impl<'s> Container<'s> {
    pub fn session(&self) -> &'s Session {
        self.session
    }

    pub fn family(&self) -> DataFamily {
        self.family
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_bands(&self) -> usize {
        self.n_bands
    }

    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.ptr
    }

    pub(crate) fn retain(&self, memory: Retained) {
        self.retained.borrow_mut().push(memory);
    }

    /// Destroy the native container now and report failures.
    ///
    /// Fails with `NoActiveSession` once the session is closed; the library
    /// has already reclaimed the container by then.
    pub fn release(mut self) -> Result<()> {
        if !self.session.is_active() {
            self.ptr = std::ptr::null_mut();
            return Err(BridgeError::NoActiveSession);
        }
        self.destroy()
    }

    /// Drop path: a closed session is a silent no-op.
    fn destroy(&mut self) -> Result<()> {
        if self.ptr.is_null() || !self.session.is_active() {
            self.ptr = std::ptr::null_mut();
            return Ok(());
        }
        let handle = self.session.handle()?;
        let mut object = self.ptr;
        self.ptr = std::ptr::null_mut();
        // Safety: `object` was returned by create_data in this session and
        // has not been destroyed.
        let status = unsafe { self.session.api().destroy_data(handle, &mut object) };
        if status != 0 {
            return Err(BridgeError::ContainerDestroyFailed {
                family: self.family.to_string(),
                status,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Container<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("family", &self.family.to_string())
            .field("geometry", &self.geometry)
            .field("n_columns", &self.n_columns)
            .field("n_rows", &self.n_rows)
            .finish()
    }
}

impl Drop for Container<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            warn!(family = %self.family, error = %e, "failed to destroy container");
        }
    }
}
