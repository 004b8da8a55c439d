//! FFI Module
//!
//! The native surface of the bridge: the `NativeApi` trait that mirrors the
//! GMT C entry points, the loader that binds it to `libgmt`, and the ABI
//! layouts used to read native containers back.
//!
//! # Architecture
//!
//! ```text
//! Session / Container / VirtualFile (safe, ownership-typed)
//!       │
//!       ▼
//! NativeApi (one method per C entry point)
//!       │
//!   ┌───┴──────────┐
//!   ▼              ▼
//! LibGmt        FakeEngine
//! (libloading)  (in-memory, tests)
//! ```
//!
//! Nothing above this module sees a raw native pointer.

pub mod abi;
mod loader;
mod types;

use std::ffi::{c_char, c_double, c_int, c_uint, c_void};

pub use abi::PrintFunc;
pub use loader::{clib_full_names, clib_names, LibGmt, LibraryLoader, REQUIRED_SYMBOLS};
pub use types::ElementKind;

/// The GMT C entry points consumed by the bridge.
///
/// Argument types are the C header types; implementors forward them to the
/// native library unchanged.
///
/// # Safety
///
/// Every method is a raw C call. Callers must pass pointers that satisfy the
/// corresponding GMT API contract (valid session handle, NUL-terminated
/// strings, buffers sized to the container geometry).
pub trait NativeApi: Send + Sync {
    /// Path or description of the backing library, for diagnostics.
    fn describe(&self) -> String;

    unsafe fn create_session(
        &self,
        tag: *const c_char,
        pad: c_uint,
        mode: c_uint,
        print: PrintFunc,
    ) -> *mut c_void;

    unsafe fn destroy_session(&self, api: *mut c_void) -> c_int;

    unsafe fn get_enum(&self, api: *mut c_void, name: *const c_char) -> c_int;

    unsafe fn get_default(&self, api: *mut c_void, keyword: *const c_char, value: *mut c_char)
        -> c_int;

    unsafe fn call_module(
        &self,
        api: *mut c_void,
        module: *const c_char,
        mode: c_int,
        args: *mut c_void,
    ) -> c_int;

    unsafe fn handle_messages(
        &self,
        api: *mut c_void,
        mode: c_uint,
        method: c_uint,
        dest: *mut c_void,
    ) -> c_int;

    #[allow(clippy::too_many_arguments)]
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
    ) -> *mut c_void;

    /// `object` points at the container pointer, which the library nulls.
    unsafe fn destroy_data(&self, api: *mut c_void, object: *mut *mut c_void) -> c_int;

    unsafe fn put_vector(
        &self,
        api: *mut c_void,
        vector: *mut c_void,
        col: c_uint,
        type_: c_uint,
        values: *mut c_void,
    ) -> c_int;

    unsafe fn put_matrix(
        &self,
        api: *mut c_void,
        matrix: *mut c_void,
        type_: c_uint,
        pad: c_int,
        values: *mut c_void,
    ) -> c_int;

    unsafe fn put_strings(
        &self,
        api: *mut c_void,
        family: c_uint,
        object: *mut c_void,
        strings: *mut *mut c_char,
    ) -> c_int;

    unsafe fn open_virtualfile(
        &self,
        api: *mut c_void,
        family: c_uint,
        geometry: c_uint,
        direction: c_uint,
        data: *mut c_void,
        name: *mut c_char,
    ) -> c_int;

    unsafe fn close_virtualfile(&self, api: *mut c_void, name: *const c_char) -> c_int;

    unsafe fn read_virtualfile(&self, api: *mut c_void, name: *const c_char) -> *mut c_void;
}

#[cfg(test)]
mod tests;
