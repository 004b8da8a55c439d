//! In-Memory Engine
//!
//! `FakeEngine` implements [`NativeApi`] without a native library. It keeps
//! sessions, containers and virtual files in memory, runs a couple of simple
//! modules, and hands back real `#[repr(C)]` GMT layouts from
//! `GMT_Read_VirtualFile`, so every code path above the trait runs
//! unchanged against it.
//!
//! It also counts calls per entry point, which lets callers assert that an
//! operation failed before reaching native code.
//!
//! ```
//! use std::sync::Arc;
//! use gmt_clib::fake::FakeEngine;
//! use gmt_clib::with_session;
//!
//! let engine = Arc::new(FakeEngine::new());
//! with_session(engine.clone(), "doc", |s| s.call_module("echo", "hello"))?;
//! assert_eq!(engine.calls("GMT_Call_Module"), 1);
//! # Ok::<(), gmt_clib::BridgeError>(())
//! ```

mod constants;
mod modules;
mod store;

use std::collections::{BTreeMap, HashMap};
use std::ffi::{c_char, c_double, c_int, c_uint, c_void, CStr};
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::debug;

use crate::ffi::abi::PrintFunc;
use crate::ffi::NativeApi;

use constants::*;
use modules::{Outcome, STATUS_BAD_ARGUMENT};
use store::{read_column, read_strings, Column, FakeObject, GridMeta, Native, Payload};

const STATUS_NOT_A_SESSION: c_int = 2;
const STATUS_NOT_A_VALID_OBJECT: c_int = 9;
const STATUS_NOT_A_VALID_TYPE: c_int = 12;
const STATUS_DIM_TOO_LARGE: c_int = 14;
const STATUS_BAD_MODE: c_int = 64;

/// A module invocation as the engine received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCall {
    pub module: String,
    /// `GMT_MODULE_CMD` or the argument count
    pub mode: c_int,
    pub args: Vec<String>,
}

/// One virtual file registered with a session
struct VirtualSlot {
    output: bool,
    /// Key of the input object, if any
    object: Option<usize>,
    /// What a module wrote into an output file
    result: Option<Payload>,
    /// Layouts handed out by `GMT_Read_VirtualFile`, freed on close
    natives: Vec<Native>,
}

struct FakeSession {
    name: String,
    objects: HashMap<usize, Box<FakeObject>>,
    vfiles: BTreeMap<String, VirtualSlot>,
    log_once: Option<PathBuf>,
}

// Safety: the raw pointers inside each slot's `natives` only point into
// allocations the slot itself owns.
unsafe impl Send for FakeSession {}

#[derive(Default)]
struct EngineState {
    sessions: HashMap<usize, FakeSession>,
    next_session: usize,
    next_vfile: usize,
    last_call: Option<ModuleCall>,
}

/// In-memory stand-in for `libgmt`
pub struct FakeEngine {
    version: String,
    reject_sessions: bool,
    state: Mutex<EngineState>,
    calls: Mutex<BTreeMap<&'static str, usize>>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            version: "6.5.0".to_string(),
            reject_sessions: false,
            state: Mutex::new(EngineState::default()),
            calls: Mutex::new(BTreeMap::new()),
        }
    }

    /// Report a different library version through `API_VERSION`.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Make `GMT_Create_Session` return null.
    pub fn rejecting_sessions(mut self) -> Self {
        self.reject_sessions = true;
        self
    }

    /// Number of calls made to one C entry point, e.g. `"GMT_Create_Data"`.
    pub fn calls(&self, entry: &str) -> usize {
        self.calls.lock().get(entry).copied().unwrap_or(0)
    }

    /// Total calls across all entry points.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Sessions created and not yet destroyed.
    pub fn live_sessions(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Containers alive across all sessions.
    pub fn live_objects(&self) -> usize {
        self.state.lock().sessions.values().map(|s| s.objects.len()).sum()
    }

    /// Virtual files open across all sessions.
    pub fn open_virtualfiles(&self) -> usize {
        self.state.lock().sessions.values().map(|s| s.vfiles.len()).sum()
    }

    /// Tags of the live sessions.
    pub fn session_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().sessions.values().map(|s| s.name.clone()).collect();
        names.sort();
        names
    }

    /// The most recent module call.
    pub fn last_call(&self) -> Option<ModuleCall> {
        self.state.lock().last_call.clone()
    }

    fn count(&self, entry: &'static str) {
        *self.calls.lock().entry(entry).or_insert(0) += 1;
    }

    fn with_session<R>(&self, api: *mut c_void, f: impl FnOnce(&mut FakeSession) -> R) -> Option<R> {
        let mut state = self.state.lock();
        state.sessions.get_mut(&(api as usize)).map(f)
    }

    fn default_value(&self, keyword: &str) -> Option<String> {
        let value = match keyword {
            "API_VERSION" => self.version.as_str(),
            "API_PAD" => "2",
            "API_BINDIR" => "/opt/gmt/bin",
            "API_SHAREDIR" => "/opt/gmt/share",
            "API_LIBRARY" => "fake",
            "API_CORES" => "1",
            "API_GRID_LAYOUT" => "rows",
            "API_IMAGE_LAYOUT" => "TRBa",
            _ => return None,
        };
        Some(value.to_string())
    }
}

unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

impl NativeApi for FakeEngine {
    fn describe(&self) -> String {
        format!("in-memory engine (GMT {})", self.version)
    }

    unsafe fn create_session(
        &self,
        tag: *const c_char,
        _pad: c_uint,
        _mode: c_uint,
        _print: PrintFunc,
    ) -> *mut c_void {
        self.count("GMT_Create_Session");
        if self.reject_sessions {
            return std::ptr::null_mut();
        }
        let name = c_str(tag).unwrap_or_default().to_string();
        let mut state = self.state.lock();
        state.next_session += 1;
        let id = state.next_session;
        state.sessions.insert(
            id,
            FakeSession {
                name,
                objects: HashMap::new(),
                vfiles: BTreeMap::new(),
                log_once: None,
            },
        );
        id as *mut c_void
    }

    unsafe fn destroy_session(&self, api: *mut c_void) -> c_int {
        self.count("GMT_Destroy_Session");
        match self.state.lock().sessions.remove(&(api as usize)) {
            Some(_) => 0,
            None => STATUS_NOT_A_SESSION,
        }
    }

    unsafe fn get_enum(&self, _api: *mut c_void, name: *const c_char) -> c_int {
        self.count("GMT_Get_Enum");
        c_str(name).map_or(crate::ffi::abi::GMT_NOTSET, lookup)
    }

    unsafe fn get_default(
        &self,
        api: *mut c_void,
        keyword: *const c_char,
        value: *mut c_char,
    ) -> c_int {
        self.count("GMT_Get_Default");
        if self.with_session(api, |_| ()).is_none() {
            return STATUS_NOT_A_SESSION;
        }
        let Some(text) = c_str(keyword).and_then(|k| self.default_value(k)) else {
            return STATUS_NOT_A_VALID_TYPE;
        };
        let bytes = text.as_bytes();
        std::ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), value, bytes.len());
        *value.add(bytes.len()) = 0;
        0
    }

    unsafe fn call_module(
        &self,
        api: *mut c_void,
        module: *const c_char,
        mode: c_int,
        args: *mut c_void,
    ) -> c_int {
        self.count("GMT_Call_Module");
        let module = c_str(module).unwrap_or_default().to_string();
        let tokens: Vec<String> = if mode == MODULE_CMD {
            c_str(args as *const c_char)
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect()
        } else if mode > 0 {
            read_strings(args as *const *const c_char, mode as usize)
        } else {
            return STATUS_BAD_MODE;
        };

        let mut state = self.state.lock();
        state.last_call = Some(ModuleCall {
            module: module.clone(),
            mode,
            args: tokens.clone(),
        });
        let Some(session) = state.sessions.get_mut(&(api as usize)) else {
            return STATUS_NOT_A_SESSION;
        };

        let Outcome { status, messages } = modules::run(session, &module, &tokens);
        match session.log_once.take() {
            Some(path) => {
                let mut text = messages.join("\n");
                if !text.is_empty() {
                    text.push('\n');
                }
                if std::fs::write(&path, text).is_err() {
                    debug!(path = %path.display(), "in-memory engine could not write its log");
                }
            }
            None => {
                for message in &messages {
                    debug!(session = %session.name, "{}", message);
                }
            }
        }
        status
    }

    unsafe fn handle_messages(
        &self,
        api: *mut c_void,
        mode: c_uint,
        method: c_uint,
        dest: *mut c_void,
    ) -> c_int {
        self.count("GMT_Handle_Messages");
        let target = match (mode, method) {
            (LOG_ONCE, IS_FILE) => match c_str(dest as *const c_char) {
                Some(path) => Some(PathBuf::from(path)),
                None => return STATUS_BAD_ARGUMENT,
            },
            (LOG_OFF, _) => None,
            _ => return STATUS_BAD_ARGUMENT,
        };
        self.with_session(api, |s| s.log_once = target)
            .map_or(STATUS_NOT_A_SESSION, |_| 0)
    }

    unsafe fn create_data(
        &self,
        api: *mut c_void,
        family: c_uint,
        _geometry: c_uint,
        mode: c_uint,
        dim: *const u64,
        range: *const c_double,
        inc: *const c_double,
        registration: c_uint,
        pad: c_int,
        _data: *mut c_void,
    ) -> *mut c_void {
        self.count("GMT_Create_Data");
        let dim = (!dim.is_null()).then(|| std::slice::from_raw_parts(dim, 4));
        let (n_columns, n_rows) = dim.map_or((0, 0), |d| (d[0] as usize, d[1] as usize));
        let region = (!range.is_null() && !inc.is_null()).then(|| {
            let r = std::slice::from_raw_parts(range, 4);
            let i = std::slice::from_raw_parts(inc, 2);
            ([r[0], r[1], r[2], r[3]], [i[0], i[1]])
        });
        let grdtype = u32::from(mode & GRID_IS_GEO != 0);
        let meta = || region.map(|(wesn, inc)| GridMeta::from_region(wesn, inc, registration, grdtype));
        let (base, via) = (family % 100, family - family % 100);
        debug!(family, mode, pad, "in-memory create_data");

        let object = if mode & IS_OUTPUT != 0 {
            FakeObject::Output
        } else {
            match (base, via) {
                (VECTOR, 0) | (DATASET, VIA_VECTOR) => FakeObject::Vectors {
                    n_rows,
                    columns: vec![None; n_columns],
                    text: None,
                },
                (MATRIX, 0) | (DATASET, VIA_MATRIX) => FakeObject::Matrix {
                    n_rows,
                    n_columns,
                    values: None,
                    text: None,
                },
                (GRID, _) => match meta() {
                    Some(meta) => FakeObject::Grid { meta, values: None },
                    None => return std::ptr::null_mut(),
                },
                (IMAGE, _) => match meta() {
                    Some(meta) => FakeObject::Image {
                        meta,
                        n_bands: dim.map_or(1, |d| (d[2] as usize).max(1)),
                        values: None,
                    },
                    None => return std::ptr::null_mut(),
                },
                _ => return std::ptr::null_mut(),
            }
        };

        let mut boxed = Box::new(object);
        let ptr = (&mut *boxed as *mut FakeObject).cast::<c_void>();
        self.with_session(api, |s| s.objects.insert(ptr as usize, boxed))
            .map_or(std::ptr::null_mut(), |_| ptr)
    }

    unsafe fn destroy_data(&self, api: *mut c_void, object: *mut *mut c_void) -> c_int {
        self.count("GMT_Destroy_Data");
        if object.is_null() {
            return STATUS_NOT_A_VALID_OBJECT;
        }
        let key = *object as usize;
        let removed = self.with_session(api, |s| {
            s.vfiles.values_mut().filter(|v| v.object == Some(key)).for_each(|v| v.object = None);
            s.objects.remove(&key).is_some()
        });
        match removed {
            Some(true) => {
                *object = std::ptr::null_mut();
                0
            }
            Some(false) => STATUS_NOT_A_VALID_OBJECT,
            None => STATUS_NOT_A_SESSION,
        }
    }

    unsafe fn put_vector(
        &self,
        api: *mut c_void,
        vector: *mut c_void,
        col: c_uint,
        type_: c_uint,
        values: *mut c_void,
    ) -> c_int {
        self.count("GMT_Put_Vector");
        self.with_session(api, |s| match s.objects.get_mut(&(vector as usize)).map(|b| &mut **b) {
            Some(FakeObject::Vectors { n_rows, columns, .. }) => {
                let Some(slot) = columns.get_mut(col as usize) else {
                    return STATUS_DIM_TOO_LARGE;
                };
                match read_column(values, type_, *n_rows) {
                    Some(column) => {
                        *slot = Some(column);
                        0
                    }
                    None => STATUS_NOT_A_VALID_TYPE,
                }
            }
            _ => STATUS_NOT_A_VALID_OBJECT,
        })
        .unwrap_or(STATUS_NOT_A_SESSION)
    }

    unsafe fn put_matrix(
        &self,
        api: *mut c_void,
        matrix: *mut c_void,
        type_: c_uint,
        pad: c_int,
        values: *mut c_void,
    ) -> c_int {
        self.count("GMT_Put_Matrix");
        let pad = pad.max(0) as usize;
        self.with_session(api, |s| {
            let object = match s.objects.get_mut(&(matrix as usize)) {
                Some(object) => &mut **object,
                None => return STATUS_NOT_A_VALID_OBJECT,
            };
            let (bands, rows, cols) = match object {
                FakeObject::Matrix { n_rows, n_columns, .. } => (1, *n_rows, *n_columns),
                FakeObject::Grid { meta, .. } => (1, meta.n_rows, meta.n_columns),
                FakeObject::Image { meta, n_bands, .. } => (*n_bands, meta.n_rows, meta.n_columns),
                _ => return STATUS_NOT_A_VALID_OBJECT,
            };
            let (padded_rows, padded_cols) = (rows + 2 * pad, cols + 2 * pad);
            let Some(Column::Numeric(raw)) = read_column(values, type_, bands * padded_rows * padded_cols) else {
                return STATUS_NOT_A_VALID_TYPE;
            };
            let mut unpadded = Vec::with_capacity(bands * rows * cols);
            for band in raw.chunks((padded_rows * padded_cols).max(1)).take(bands) {
                for row in band.chunks(padded_cols.max(1)).skip(pad).take(rows) {
                    unpadded.extend_from_slice(&row[pad..pad + cols]);
                }
            }
            match object {
                FakeObject::Matrix { values, .. } => *values = Some(unpadded),
                FakeObject::Grid { values, .. } => *values = Some(unpadded.iter().map(|&v| v as f32).collect()),
                FakeObject::Image { values, .. } => *values = Some(unpadded.iter().map(|&v| v as u8).collect()),
                _ => {}
            }
            0
        })
        .unwrap_or(STATUS_NOT_A_SESSION)
    }

    unsafe fn put_strings(
        &self,
        api: *mut c_void,
        family: c_uint,
        object: *mut c_void,
        strings: *mut *mut c_char,
    ) -> c_int {
        self.count("GMT_Put_Strings");
        let family = family & !(IS_DUPLICATE | IS_REFERENCE);
        self.with_session(api, |s| match (family, s.objects.get_mut(&(object as usize)).map(|b| &mut **b)) {
            (VECTOR, Some(FakeObject::Vectors { n_rows, text, .. }))
            | (MATRIX, Some(FakeObject::Matrix { n_rows, text, .. })) => {
                *text = Some(read_strings(strings as *const *const c_char, *n_rows));
                0
            }
            _ => STATUS_NOT_A_VALID_OBJECT,
        })
        .unwrap_or(STATUS_NOT_A_SESSION)
    }

    unsafe fn open_virtualfile(
        &self,
        api: *mut c_void,
        _family: c_uint,
        _geometry: c_uint,
        direction: c_uint,
        data: *mut c_void,
        name: *mut c_char,
    ) -> c_int {
        self.count("GMT_Open_VirtualFile");
        let output = direction & OUT != 0;
        let mut state = self.state.lock();
        state.next_vfile += 1;
        let vfname = format!("@GMTAPI@-{:06}", state.next_vfile);
        let Some(session) = state.sessions.get_mut(&(api as usize)) else {
            return STATUS_NOT_A_SESSION;
        };

        let key = data as usize;
        let object = match session.objects.get(&key).map(|b| &**b) {
            Some(FakeObject::Output) | None if output => None,
            Some(_) if !output => Some(key),
            _ => return STATUS_NOT_A_VALID_OBJECT,
        };
        session.vfiles.insert(
            vfname.clone(),
            VirtualSlot {
                output,
                object,
                result: None,
                natives: Vec::new(),
            },
        );

        let bytes = vfname.as_bytes();
        std::ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), name, bytes.len().min(VF_LEN - 1));
        *name.add(bytes.len().min(VF_LEN - 1)) = 0;
        0
    }

    unsafe fn close_virtualfile(&self, api: *mut c_void, name: *const c_char) -> c_int {
        self.count("GMT_Close_VirtualFile");
        let Some(name) = c_str(name) else {
            return STATUS_BAD_ARGUMENT;
        };
        self.with_session(api, |s| match s.vfiles.remove(name) {
            Some(_) => 0,
            None => STATUS_NOT_A_VALID_OBJECT,
        })
        .unwrap_or(STATUS_NOT_A_SESSION)
    }

    unsafe fn read_virtualfile(&self, api: *mut c_void, name: *const c_char) -> *mut c_void {
        self.count("GMT_Read_VirtualFile");
        let Some(name) = c_str(name) else {
            return std::ptr::null_mut();
        };
        self.with_session(api, |s| {
            let Some(slot) = s.vfiles.get_mut(name) else {
                return std::ptr::null_mut();
            };
            let Some(payload) = &slot.result else {
                return std::ptr::null_mut();
            };
            let mut native = Native::build(payload);
            let ptr = native.as_ptr();
            slot.natives.push(native);
            ptr
        })
        .unwrap_or(std::ptr::null_mut())
    }
}

#[cfg(test)]
mod tests;
