//! Module Invoker
//!
//! Runs a GMT module by name. Arguments travel either as one command-line
//! string (`GMT_MODULE_CMD`) or as an argv-style token list whose length is
//! passed as the mode. Library messages for the call are captured in a log
//! file and attached to the error when the module fails.

use std::ffi::{c_char, c_int, c_uint, c_void, CString};
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{BridgeError, Result};
use crate::session::Session;

/// Module arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleArgs {
    /// One command-line string, split by the library
    Line(String),
    /// Pre-split tokens, passed through unchanged
    Tokens(Vec<String>),
}

impl ModuleArgs {
    fn pieces(&self) -> &[String] {
        match self {
            ModuleArgs::Line(line) => std::slice::from_ref(line),
            ModuleArgs::Tokens(tokens) => tokens,
        }
    }
}

impl From<&str> for ModuleArgs {
    fn from(line: &str) -> Self {
        ModuleArgs::Line(line.to_string())
    }
}

impl From<String> for ModuleArgs {
    fn from(line: String) -> Self {
        ModuleArgs::Line(line)
    }
}

impl From<Vec<String>> for ModuleArgs {
    fn from(tokens: Vec<String>) -> Self {
        ModuleArgs::Tokens(tokens)
    }
}

impl From<Vec<&str>> for ModuleArgs {
    fn from(tokens: Vec<&str>) -> Self {
        ModuleArgs::Tokens(tokens.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ModuleArgs {
    fn from(tokens: [&str; N]) -> Self {
        ModuleArgs::Tokens(tokens.iter().map(|t| t.to_string()).collect())
    }
}

fn c_string(value: &str) -> Result<CString> {
    CString::new(value).map_err(|_| BridgeError::InvalidArgument(format!("{:?} contains a NUL byte", value)))
}

impl Session {
    /// Run `module` with `args`.
    ///
    /// Fails with `StaleVirtualFile` before calling the library when an
    /// argument names a virtual file that has already been closed.
    pub fn call_module(&self, module: &str, args: impl Into<ModuleArgs>) -> Result<()> {
        let handle = self.handle()?;
        let args = args.into();
        self.check_tokens(args.pieces())?;
        let c_module = c_string(module)?;

        let (mode, strings, argv_style) = match &args {
            ModuleArgs::Tokens(tokens) if !tokens.is_empty() => (
                tokens.len() as c_int,
                tokens.iter().map(|t| c_string(t)).collect::<Result<Vec<_>>>()?,
                true,
            ),
            ModuleArgs::Tokens(_) => (self.constant("GMT_MODULE_CMD")?, vec![c_string("")?], false),
            ModuleArgs::Line(line) => (self.constant("GMT_MODULE_CMD")?, vec![c_string(line)?], false),
        };
        let mut argv: Vec<*const c_char> = strings.iter().map(|s| s.as_ptr()).collect();
        let args_ptr: *mut c_void = if argv_style {
            argv.as_mut_ptr().cast()
        } else {
            argv[0] as *mut c_void
        };

        debug!(session = %self.name(), module, ?args, "calling module");
        // Safety: `strings` and `argv` outlive the call; `mode` matches the
        // shape of `args_ptr`.
        let (status, log) = self.log_to_file(None, || unsafe {
            self.api().call_module(handle, c_module.as_ptr(), mode, args_ptr)
        })?;
        for line in log.lines() {
            trace!(module, "{}", line);
        }
        debug!(session = %self.name(), module, status, "module returned");

        if status != 0 {
            return Err(BridgeError::ModuleCallFailed {
                module: module.to_string(),
                status,
                log: log.trim_end().to_string(),
            });
        }
        Ok(())
    }

    /// Send the library's messages for the next call made in `f` to a file.
    ///
    /// Without `path` a temporary file is used and removed afterwards.
    /// Returns the result of `f` and whatever the library logged.
    pub fn log_to_file<T>(&self, path: Option<&Path>, f: impl FnOnce() -> T) -> Result<(T, String)> {
        let handle = self.handle()?;
        let temp;
        let path = match path {
            Some(path) => path,
            None => {
                temp = tempfile::Builder::new()
                    .prefix("gmt-clib-")
                    .suffix(".log")
                    .tempfile()?;
                temp.path()
            }
        };
        let c_path = c_string(&path.to_string_lossy())?;
        let mode = self.constant("GMT_LOG_ONCE")? as c_uint;
        let method = self.constant("GMT_IS_FILE")? as c_uint;

        // Safety: the library copies the file name before returning.
        let status = unsafe {
            self.api()
                .handle_messages(handle, mode, method, c_path.as_ptr() as *mut c_void)
        };
        if status != 0 {
            return Err(BridgeError::LogRedirectFailed {
                path: path.to_path_buf(),
                status,
            });
        }

        let value = f();
        Ok((value, read_log(path)?))
    }
}

/// Read a captured log. Non-UTF-8 bytes (file names echoed verbatim) are
/// replaced, not dropped; a log the library never created is empty.
fn read_log(path: &Path) -> Result<String> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}
