//! Session Manager
//!
//! A `Session` owns one native GMT API handle. Its lifecycle is
//! `Unopened -> Active -> Closed`; every bridge operation checks for an
//! active session locally before touching the library.
//!
//! ```ignore
//! let lib = LibraryLoader::new().load()?;
//! let rows = with_session(lib, "demo", |session| {
//!     session.call_module("gmtset", "FORMAT_GEO_MAP ddd:mm:ssF")?;
//!     Ok(())
//! })?;
//! ```
//!
//! A session holds a raw native pointer and is therefore neither `Send` nor
//! `Sync`. Independent work in parallel needs independent sessions.

mod constants;
mod info;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashSet};
use std::ffi::{c_int, c_uint, c_void, CString};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::SessionConfig;
use crate::error::{BridgeError, Result};
use crate::ffi::NativeApi;

use constants::ConstantCache;
pub use info::{parse_version, LibraryInfo};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Active,
    Closed,
}

/// One native GMT API session
pub struct Session {
    api: Arc<dyn NativeApi>,
    name: String,
    config: SessionConfig,
    state: Cell<SessionState>,
    handle: Cell<*mut c_void>,
    constants: ConstantCache,
    /// Virtual files currently open
    open_files: RefCell<BTreeSet<String>>,
    /// Virtual files released during this session's lifetime
    released: RefCell<HashSet<String>>,
}

impl Session {
    /// Create an unopened session.
    pub fn new(api: Arc<dyn NativeApi>, name: impl Into<String>) -> Self {
        let config = SessionConfig {
            name: name.into(),
            ..SessionConfig::default()
        };
        Self::with_config(api, config)
    }

    /// Create an unopened session from configuration.
    pub fn with_config(api: Arc<dyn NativeApi>, config: SessionConfig) -> Self {
        Self {
            api,
            name: config.name.clone(),
            config,
            state: Cell::new(SessionState::Unopened),
            handle: Cell::new(std::ptr::null_mut()),
            constants: ConstantCache::new(),
            open_files: RefCell::new(BTreeSet::new()),
            released: RefCell::new(HashSet::new()),
        }
    }

    /// Create and open a session in one step.
    pub fn begin(api: Arc<dyn NativeApi>, name: impl Into<String>) -> Result<Self> {
        let session = Self::new(api, name);
        session.open()?;
        Ok(session)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state.get() == SessionState::Active
    }

    /// Create the native session.
    ///
    /// Uses the library's default padding (unless configured), the
    /// external-API session mode and no print callback.
    pub fn open(&self) -> Result<()> {
        if self.state.get() != SessionState::Unopened {
            return Err(BridgeError::SessionCreateFailed {
                name: self.name.clone(),
                reason: format!("session is {:?}, not Unopened", self.state.get()),
            });
        }

        let pad = match self.config.pad {
            Some(pad) => pad as c_uint,
            None => self.resolve("GMT_PAD_DEFAULT")? as c_uint,
        };
        let mode = self.resolve("GMT_SESSION_EXTERNAL")? as c_uint;
        let tag = CString::new(self.name.as_str()).map_err(|_| BridgeError::SessionCreateFailed {
            name: self.name.clone(),
            reason: "name contains a NUL byte".to_string(),
        })?;

        // Safety: `tag` is NUL-terminated; a null print callback selects the
        // library's default message handling.
        let handle = unsafe { self.api.create_session(tag.as_ptr(), pad, mode, None) };
        if handle.is_null() {
            return Err(BridgeError::SessionCreateFailed {
                name: self.name.clone(),
                reason: "GMT_Create_Session returned a null handle".to_string(),
            });
        }
        self.handle.set(handle);
        self.state.set(SessionState::Active);
        debug!(session = %self.name, pad, "opened GMT session");

        if let Err(e) = self.check_version() {
            if let Err(close_err) = self.close() {
                warn!(session = %self.name, error = %close_err, "failed to close rejected session");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Destroy the native session.
    ///
    /// Closing twice is an error, not a no-op.
    pub fn close(&self) -> Result<()> {
        let handle = self.handle()?;
        let open = self.open_files.borrow().len();
        if open > 0 {
            warn!(session = %self.name, open, "closing session with open virtual files");
        }

        // Safety: `handle` came from create_session and has not been destroyed.
        let status = unsafe { self.api.destroy_session(handle) };
        self.handle.set(std::ptr::null_mut());
        self.state.set(SessionState::Closed);
        self.open_files.borrow_mut().clear();
        debug!(session = %self.name, status, "destroyed GMT session");

        if status != 0 {
            return Err(BridgeError::SessionDestroyFailed {
                name: self.name.clone(),
                status,
            });
        }
        Ok(())
    }

    /// Native handle of an active session.
    pub(crate) fn handle(&self) -> Result<*mut c_void> {
        if self.state.get() != SessionState::Active {
            return Err(BridgeError::NoActiveSession);
        }
        Ok(self.handle.get())
    }

    pub(crate) fn api(&self) -> &dyn NativeApi {
        self.api.as_ref()
    }

    /// Resolve a named GMT constant.
    pub fn constant(&self, name: &str) -> Result<c_int> {
        let handle = self.handle()?;
        self.constants.resolve(self.api(), handle, name)
    }

    /// Number of constants resolved so far.
    pub fn cached_constants(&self) -> usize {
        self.constants.len()
    }

    /// Constant lookup usable before the native session exists.
    fn resolve(&self, name: &str) -> Result<c_int> {
        self.constants.resolve(self.api(), self.handle.get(), name)
    }

    // =========================================================================
    // Virtual file bookkeeping
    // =========================================================================

    pub(crate) fn register_virtualfile(&self, name: &str) -> Result<()> {
        if self.released.borrow().contains(name) || !self.open_files.borrow_mut().insert(name.to_string()) {
            return Err(BridgeError::InvalidArgument(format!(
                "virtual file name '{}' was issued twice in session '{}'",
                name, self.name
            )));
        }
        Ok(())
    }

    pub(crate) fn release_virtualfile(&self, name: &str) {
        self.open_files.borrow_mut().remove(name);
        self.released.borrow_mut().insert(name.to_string());
    }

    /// Names of the virtual files currently open.
    pub fn open_virtualfiles(&self) -> Vec<String> {
        self.open_files.borrow().iter().cloned().collect()
    }

    /// Fail if any argument references a released virtual file.
    pub(crate) fn check_tokens<S: AsRef<str>>(&self, args: &[S]) -> Result<()> {
        let released = self.released.borrow();
        if released.is_empty() {
            return Ok(());
        }
        for arg in args {
            let arg = arg.as_ref();
            if let Some(name) = released.iter().find(|name| arg.contains(name.as_str())) {
                return Err(BridgeError::StaleVirtualFile(name.clone()));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("state", &self.state.get())
            .field("library", &self.api.describe())
            .field("open_files", &self.open_files.borrow().len())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_active() {
            if let Err(e) = self.close() {
                error!(session = %self.name, error = %e, "failed to destroy session on drop");
            }
        }
    }
}

/// Run `f` inside a freshly opened session that is closed on every exit path.
///
/// An error from `f` takes precedence over an error from closing.
pub fn with_session<T, F>(api: Arc<dyn NativeApi>, name: &str, f: F) -> Result<T>
where
    F: FnOnce(&Session) -> Result<T>,
{
    let session = Session::begin(api, name)?;
    let result = f(&session);
    let closed = session.close();
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!(session = name, error = %close_err, "failed to close session after error");
            Err(e)
        }
    }
}
