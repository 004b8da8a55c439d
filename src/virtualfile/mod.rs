//! Virtual File Registry
//!
//! A virtual file is a library-issued name (`@GMTAPI@-...`) that modules
//! accept wherever they accept a file path. Input files wrap a container the
//! bridge filled; output files are filled by a module and read back by the
//! materializer.
//!
//! Names are tracked per session: the registry never hands out the same name
//! twice, and module arguments that mention a closed virtual file are
//! rejected before they reach the library.

mod input;
mod output;

use std::ffi::{c_char, c_uint, CStr, CString};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::container::{Container, DataFamily, Geometry};
use crate::error::{BridgeError, Result};
use crate::session::Session;

pub use output::OutputKind;

/// Data flow relative to the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// How the library treats the attached container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Reference,
    Duplicate,
}

/// A parsed `GMT_IN|GMT_IS_REFERENCE` style direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionSpec {
    pub direction: Direction,
    pub method: Option<Method>,
}

impl DirectionSpec {
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || BridgeError::InvalidDirection(s.to_string());
        let mut direction = None;
        let mut method = None;
        for token in s.split('|').map(str::trim) {
            let (d, m) = match token {
                "GMT_IN" => (Some(Direction::In), None),
                "GMT_OUT" => (Some(Direction::Out), None),
                "GMT_IS_REFERENCE" => (None, Some(Method::Reference)),
                "GMT_IS_DUPLICATE" => (None, Some(Method::Duplicate)),
                _ => return Err(invalid()),
            };
            if let Some(d) = d {
                if direction.replace(d).is_some() {
                    return Err(invalid());
                }
            }
            if let Some(m) = m {
                if method.replace(m).is_some() {
                    return Err(invalid());
                }
            }
        }
        Ok(Self {
            direction: direction.ok_or_else(invalid)?,
            method,
        })
    }

    fn resolve(&self, session: &Session) -> Result<c_uint> {
        let mut value = match self.direction {
            Direction::In => session.constant("GMT_IN")?,
            Direction::Out => session.constant("GMT_OUT")?,
        };
        match self.method {
            Some(Method::Reference) => value += session.constant("GMT_IS_REFERENCE")?,
            Some(Method::Duplicate) => value += session.constant("GMT_IS_DUPLICATE")?,
            None => {}
        }
        Ok(value as c_uint)
    }
}

enum Backing<'s> {
    /// A filled container the library reads from
    Input(Container<'s>),
    /// Nothing attached; a module writes the result
    Output,
    /// A real file, passed through unchanged
    Path(PathBuf),
}

/// An open virtual file, closed when dropped
pub struct VirtualFile<'s> {
    session: &'s Session,
    name: String,
    direction: Direction,
    family: Option<DataFamily>,
    backing: Backing<'s>,
    open: bool,
}

impl Session {
    /// Open a virtual file bound to `data`.
    ///
    /// Input files need a container; output files take none.
    pub fn open_virtualfile<'s>(
        &'s self,
        family: &str,
        geometry: &str,
        direction: &str,
        data: Option<Container<'s>>,
    ) -> Result<VirtualFile<'s>> {
        let handle = self.handle()?;
        let family = DataFamily::parse(family)?;
        let geometry = Geometry::parse(geometry)?;
        let spec = DirectionSpec::parse(direction)?;
        if let Some(container) = &data {
            if !std::ptr::eq(container.session(), self) {
                return Err(BridgeError::InvalidArgument(
                    "container belongs to a different session".to_string(),
                ));
            }
        }
        let (data_ptr, backing) = match (spec.direction, data) {
            (Direction::In, Some(container)) => (container.as_ptr(), Backing::Input(container)),
            (Direction::In, None) => {
                return Err(BridgeError::InvalidArgument(
                    "an input virtual file needs a container".to_string(),
                ))
            }
            (Direction::Out, Some(container)) => (container.as_ptr(), Backing::Input(container)),
            (Direction::Out, None) => (std::ptr::null_mut(), Backing::Output),
        };

        let family_code = family.resolve(self)? as c_uint;
        let geometry_code = geometry.resolve(self)? as c_uint;
        let direction_code = spec.resolve(self)?;
        let len = self.constant("GMT_VF_LEN")?.max(1) as usize;
        let mut buffer = vec![0 as c_char; len + 1];

        // Safety: `buffer` holds GMT_VF_LEN bytes plus a terminator; the
        // container (if any) stays alive inside the returned VirtualFile.
        let status = unsafe {
            self.api().open_virtualfile(
                handle,
                family_code,
                geometry_code,
                direction_code,
                data_ptr,
                buffer.as_mut_ptr(),
            )
        };
        if status != 0 {
            return Err(BridgeError::VirtualFileOpenFailed { status });
        }
        buffer[len] = 0;
        let name = unsafe { CStr::from_ptr(buffer.as_ptr()) }.to_string_lossy().into_owned();
        if let Err(e) = self.register_virtualfile(&name) {
            // Safety: `buffer` still holds the name the library just issued.
            let status = unsafe { self.api().close_virtualfile(handle, buffer.as_ptr()) };
            if status != 0 {
                error!(vfile = %name, status, "failed to close unregistered virtual file");
            }
            return Err(e);
        }
        debug!(session = %self.name(), vfile = %name, %family, ?spec, "opened virtual file");

        Ok(VirtualFile {
            session: self,
            name,
            direction: spec.direction,
            family: Some(family),
            backing,
            open: true,
        })
    }
}

impl<'s> VirtualFile<'s> {
    /// Wrap a real file path so it can be used where a virtual file is expected.
    pub(crate) fn passthrough(session: &'s Session, path: &Path, direction: Direction) -> Self {
        Self {
            session,
            name: path.to_string_lossy().into_owned(),
            direction,
            family: None,
            backing: Backing::Path(path.to_path_buf()),
            open: true,
        }
    }

    /// The name to pass to a module.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn family(&self) -> Option<DataFamily> {
        self.family
    }

    pub fn session(&self) -> &'s Session {
        self.session
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// True for real files passed through by name.
    pub fn is_path(&self) -> bool {
        matches!(self.backing, Backing::Path(_))
    }

    /// The real file behind a pass-through.
    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::Path(path) => Some(path),
            _ => None,
        }
    }

    /// The container the library reads from.
    pub fn container(&self) -> Option<&Container<'s>> {
        match &self.backing {
            Backing::Input(container) => Some(container),
            _ => None,
        }
    }

    /// True when a module fills this file and the library holds the result.
    pub fn holds_output(&self) -> bool {
        self.direction == Direction::Out && !self.is_path()
    }

    /// Close the virtual file and report failures.
    ///
    /// Fails with `NoActiveSession` once the session is closed.
    pub fn close(mut self) -> Result<()> {
        if !self.session.is_active() {
            self.open = false;
            return Err(BridgeError::NoActiveSession);
        }
        self.close_inner()
    }

    fn close_inner(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        if self.is_path() || !self.session.is_active() {
            return Ok(());
        }

        let handle = self.session.handle()?;
        let name = CString::new(self.name.as_str())
            .map_err(|_| BridgeError::InvalidArgument(format!("virtual file name {:?}", self.name)))?;
        // Safety: `name` is NUL-terminated and was issued by this session.
        let status = unsafe { self.session.api().close_virtualfile(handle, name.as_ptr()) };
        self.session.release_virtualfile(&self.name);
        debug!(vfile = %self.name, status, "closed virtual file");
        if status != 0 {
            return Err(BridgeError::VirtualFileCloseFailed {
                name: self.name.clone(),
                status,
            });
        }
        Ok(())
    }
}

impl fmt::Display for VirtualFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for VirtualFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFile")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("open", &self.open)
            .finish()
    }
}

impl AsRef<str> for VirtualFile<'_> {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl Drop for VirtualFile<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.close_inner() {
            error!(vfile = %self.name, error = %e, "failed to close virtual file");
        }
    }
}
