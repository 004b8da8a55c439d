//! Type Registry
//!
//! Resolves GMT named constants through `GMT_Get_Enum`. Values are cached
//! per session and never shared across sessions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_int, c_void, CString};

use tracing::trace;

use crate::error::{BridgeError, Result};
use crate::ffi::abi::GMT_NOTSET;
use crate::ffi::NativeApi;

/// Append-only cache of resolved constants
#[derive(Debug, Default)]
pub(crate) struct ConstantCache {
    values: RefCell<HashMap<String, c_int>>,
}

impl ConstantCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Resolve `name`, consulting the cache first.
    ///
    /// `handle` may be null: GMT answers enum lookups without a session.
    pub(crate) fn resolve(
        &self,
        api: &dyn NativeApi,
        handle: *mut c_void,
        name: &str,
    ) -> Result<c_int> {
        if let Some(&value) = self.values.borrow().get(name) {
            return Ok(value);
        }

        let c_name = CString::new(name).map_err(|_| BridgeError::UnknownConstant(name.to_string()))?;
        // Safety: `c_name` is NUL-terminated and outlives the call.
        let value = unsafe { api.get_enum(handle, c_name.as_ptr()) };
        if value == GMT_NOTSET {
            return Err(BridgeError::UnknownConstant(name.to_string()));
        }

        trace!(name, value, "resolved constant");
        self.values.borrow_mut().insert(name.to_string(), value);
        Ok(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.values.borrow().len()
    }
}
