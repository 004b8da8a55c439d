//! Dynamic Library Loader
//!
//! Finds `libgmt`, loads it with libloading and binds the entry points the
//! bridge needs into a typed function table.

use std::ffi::{c_char, c_double, c_int, c_uint, c_void, OsStr};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use libloading::Library;
use tracing::{debug, info};

use super::abi::*;
use super::NativeApi;
use crate::error::{BridgeError, Result};

/// Environment variable naming the directory that holds `libgmt`.
pub const LIBRARY_PATH_ENV: &str = "GMT_LIBRARY_PATH";

/// Symbols that must be present for the library to be usable.
pub const REQUIRED_SYMBOLS: [&str; 14] = [
    "GMT_Create_Session",
    "GMT_Destroy_Session",
    "GMT_Get_Enum",
    "GMT_Get_Default",
    "GMT_Call_Module",
    "GMT_Handle_Messages",
    "GMT_Create_Data",
    "GMT_Destroy_Data",
    "GMT_Put_Vector",
    "GMT_Put_Matrix",
    "GMT_Put_Strings",
    "GMT_Open_VirtualFile",
    "GMT_Close_VirtualFile",
    "GMT_Read_VirtualFile",
];

/// Resolved entry points of a loaded library
struct FunctionTable {
    create_session: CreateSessionFn,
    destroy_session: DestroySessionFn,
    get_enum: GetEnumFn,
    get_default: GetDefaultFn,
    call_module: CallModuleFn,
    handle_messages: HandleMessagesFn,
    create_data: CreateDataFn,
    destroy_data: DestroyDataFn,
    put_vector: PutVectorFn,
    put_matrix: PutMatrixFn,
    put_strings: PutStringsFn,
    open_virtualfile: OpenVirtualFileFn,
    close_virtualfile: CloseVirtualFileFn,
    read_virtualfile: ReadVirtualFileFn,
}

/// A loaded GMT shared library
pub struct LibGmt {
    /// Path the library was loaded from
    path: PathBuf,
    /// Function pointers into `library`
    fns: FunctionTable,
    /// Keeps the mapping alive for as long as `fns` is reachable
    _library: Library,
}

impl LibGmt {
    /// Load the library at `path` and bind every required symbol.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Safety: loading a shared library runs its initializers. The caller
        // chose this path as a GMT library.
        let library = unsafe { Library::new(path.as_os_str()) }.map_err(|e| {
            BridgeError::LibraryNotFound {
                attempts: vec![(path.clone(), e.to_string())],
            }
        })?;

        let fns = bind(&library, &path)?;
        info!(path = %path.display(), "loaded GMT library");

        Ok(Self {
            path,
            fns,
            _library: library,
        })
    }

    /// Get the path to this library
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn symbol<T: Copy>(library: &Library, path: &Path, name: &str) -> Result<T> {
    let mut c_name = name.as_bytes().to_vec();
    c_name.push(0);
    // Safety: `T` is the function pointer type declared for `name` in abi.rs.
    unsafe {
        library
            .get::<T>(&c_name)
            .map(|sym| *sym)
            .map_err(|_| BridgeError::LibraryInvalid {
                path: path.to_path_buf(),
                symbol: name.to_string(),
            })
    }
}

fn bind(library: &Library, path: &Path) -> Result<FunctionTable> {
    Ok(FunctionTable {
        create_session: symbol(library, path, "GMT_Create_Session")?,
        destroy_session: symbol(library, path, "GMT_Destroy_Session")?,
        get_enum: symbol(library, path, "GMT_Get_Enum")?,
        get_default: symbol(library, path, "GMT_Get_Default")?,
        call_module: symbol(library, path, "GMT_Call_Module")?,
        handle_messages: symbol(library, path, "GMT_Handle_Messages")?,
        create_data: symbol(library, path, "GMT_Create_Data")?,
        destroy_data: symbol(library, path, "GMT_Destroy_Data")?,
        put_vector: symbol(library, path, "GMT_Put_Vector")?,
        put_matrix: symbol(library, path, "GMT_Put_Matrix")?,
        put_strings: symbol(library, path, "GMT_Put_Strings")?,
        open_virtualfile: symbol(library, path, "GMT_Open_VirtualFile")?,
        close_virtualfile: symbol(library, path, "GMT_Close_VirtualFile")?,
        read_virtualfile: symbol(library, path, "GMT_Read_VirtualFile")?,
    })
}

impl NativeApi for LibGmt {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    unsafe fn create_session(
        &self,
        tag: *const c_char,
        pad: c_uint,
        mode: c_uint,
        print: PrintFunc,
    ) -> *mut c_void {
        (self.fns.create_session)(tag, pad, mode, print)
    }

    unsafe fn destroy_session(&self, api: *mut c_void) -> c_int {
        (self.fns.destroy_session)(api)
    }

    unsafe fn get_enum(&self, api: *mut c_void, name: *const c_char) -> c_int {
        (self.fns.get_enum)(api, name)
    }

    unsafe fn get_default(
        &self,
        api: *mut c_void,
        keyword: *const c_char,
        value: *mut c_char,
    ) -> c_int {
        (self.fns.get_default)(api, keyword, value)
    }

    unsafe fn call_module(
        &self,
        api: *mut c_void,
        module: *const c_char,
        mode: c_int,
        args: *mut c_void,
    ) -> c_int {
        (self.fns.call_module)(api, module, mode, args)
    }

    unsafe fn handle_messages(
        &self,
        api: *mut c_void,
        mode: c_uint,
        method: c_uint,
        dest: *mut c_void,
    ) -> c_int {
        (self.fns.handle_messages)(api, mode, method, dest)
    }

    unsafe fn create_data(
        &self,
        api: *mut c_void,
        family: c_uint,
        geometry: c_uint,
        mode: c_uint,
        dim: *const u64,
        range: *const c_double,
        inc: *const c_double,
        registration: c_uint,
        pad: c_int,
        data: *mut c_void,
    ) -> *mut c_void {
        (self.fns.create_data)(
            api,
            family,
            geometry,
            mode,
            dim,
            range,
            inc,
            registration,
            pad,
            data,
        )
    }

    unsafe fn destroy_data(&self, api: *mut c_void, object: *mut *mut c_void) -> c_int {
        (self.fns.destroy_data)(api, object as *mut c_void)
    }

    unsafe fn put_vector(
        &self,
        api: *mut c_void,
        vector: *mut c_void,
        col: c_uint,
        type_: c_uint,
        values: *mut c_void,
    ) -> c_int {
        (self.fns.put_vector)(api, vector, col, type_, values)
    }

    unsafe fn put_matrix(
        &self,
        api: *mut c_void,
        matrix: *mut c_void,
        type_: c_uint,
        pad: c_int,
        values: *mut c_void,
    ) -> c_int {
        (self.fns.put_matrix)(api, matrix, type_, pad, values)
    }

    unsafe fn put_strings(
        &self,
        api: *mut c_void,
        family: c_uint,
        object: *mut c_void,
        strings: *mut *mut c_char,
    ) -> c_int {
        (self.fns.put_strings)(api, family, object, strings)
    }

    unsafe fn open_virtualfile(
        &self,
        api: *mut c_void,
        family: c_uint,
        geometry: c_uint,
        direction: c_uint,
        data: *mut c_void,
        name: *mut c_char,
    ) -> c_int {
        (self.fns.open_virtualfile)(api, family, geometry, direction, data, name)
    }

    unsafe fn close_virtualfile(&self, api: *mut c_void, name: *const c_char) -> c_int {
        (self.fns.close_virtualfile)(api, name)
    }

    unsafe fn read_virtualfile(&self, api: *mut c_void, name: *const c_char) -> *mut c_void {
        (self.fns.read_virtualfile)(api, name)
    }
}

// =============================================================================
// Candidate search
// =============================================================================

/// Library file names the OS loader should recognize on `os`.
pub fn clib_names(os: &str) -> Vec<&'static str> {
    match os {
        "linux" | "freebsd" | "netbsd" | "openbsd" => vec!["libgmt.so"],
        "macos" => vec!["libgmt.dylib"],
        "windows" => vec!["gmt.dll", "gmt_w64.dll", "gmt_w32.dll"],
        _ => vec!["libgmt.so"],
    }
}

/// Ordered list of library candidates to try.
///
/// `env_dir` is the value of `GMT_LIBRARY_PATH`, `extra_dirs` are configured
/// search directories. The bare names come last so that the system loader's
/// own search path is tried after every explicit location.
pub fn clib_full_names(env_dir: Option<&OsStr>, extra_dirs: &[PathBuf]) -> Vec<PathBuf> {
    let names = clib_names(std::env::consts::OS);
    let mut candidates = Vec::new();

    if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
        let dir = PathBuf::from(dir);
        for name in &names {
            candidates.push(dir.join(name));
        }
    }

    if let Some(path) = show_library() {
        candidates.push(path);
    }

    for dir in extra_dirs {
        for name in &names {
            candidates.push(dir.join(name));
        }
    }

    for name in &names {
        candidates.push(PathBuf::from(name));
    }

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.clone()));
    candidates
}

/// Ask a `gmt` executable on PATH where its library lives.
fn show_library() -> Option<PathBuf> {
    let gmt = which::which("gmt").ok()?;
    let output = Command::new(gmt).arg("--show-library").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    path.exists().then_some(path)
}

/// Library loader with search paths
#[derive(Debug, Clone, Default)]
pub struct LibraryLoader {
    /// Explicit library file tried before any search
    hint: Option<PathBuf>,
    /// Additional directories to search
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    /// Create a new library loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Try this file before anything else
    pub fn with_hint(mut self, path: impl Into<PathBuf>) -> Self {
        self.hint = Some(path.into());
        self
    }

    /// Add a search path
    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.push(path.as_ref().to_path_buf());
    }

    /// Every candidate path in the order it will be tried.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let env_dir = std::env::var_os(LIBRARY_PATH_ENV);
        let mut candidates: Vec<PathBuf> = self.hint.iter().cloned().collect();
        for c in clib_full_names(env_dir.as_deref(), &self.search_paths) {
            if !candidates.contains(&c) {
                candidates.push(c);
            }
        }
        candidates
    }

    /// Load the first candidate that opens and exposes every required symbol.
    ///
    /// A candidate that opens but lacks a symbol fails immediately with
    /// `LibraryInvalid`; it is a GMT library of the wrong shape, not a miss.
    pub fn load(&self) -> Result<Arc<LibGmt>> {
        let mut attempts = Vec::new();
        for candidate in self.candidates() {
            // Bare names are resolved by the OS loader, so only skip paths
            // that name a directory component and do not exist.
            if candidate.components().count() > 1 && !candidate.exists() {
                attempts.push((candidate, "no such file".to_string()));
                continue;
            }
            match LibGmt::load(&candidate) {
                Ok(lib) => return Ok(Arc::new(lib)),
                Err(BridgeError::LibraryNotFound { attempts: mut failed }) => {
                    debug!(candidate = %candidate.display(), "candidate failed to load");
                    attempts.append(&mut failed);
                }
                Err(e) => return Err(e),
            }
        }
        Err(BridgeError::LibraryNotFound { attempts })
    }
}
