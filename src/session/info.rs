//! Library information read through `GMT_Get_Default`.

use std::collections::BTreeMap;
use std::ffi::{c_char, CStr, CString};

use crate::error::{BridgeError, Result};
use crate::ffi::abi::DEFAULT_VALUE_LEN;

use super::Session;

/// Facts about the loaded library, keyed by a readable label
pub type LibraryInfo = BTreeMap<&'static str, String>;

const REQUIRED_INFO: [(&str, &str); 4] = [
    ("version", "API_VERSION"),
    ("padding", "API_PAD"),
    ("binary dir", "API_BINDIR"),
    ("share dir", "API_SHAREDIR"),
];

const OPTIONAL_INFO: [(&str, &str); 6] = [
    ("library path", "API_LIBRARY"),
    ("data dir", "API_DATADIR"),
    ("plugin dir", "API_PLUGINDIR"),
    ("cores", "API_CORES"),
    ("grid layout", "API_GRID_LAYOUT"),
    ("image layout", "API_IMAGE_LAYOUT"),
];

impl Session {
    /// Read one API default parameter.
    pub fn get_default(&self, name: &str) -> Result<String> {
        let handle = self.handle()?;
        let keyword = CString::new(name).map_err(|_| BridgeError::DefaultNotFound(name.to_string()))?;
        let mut value = vec![0 as c_char; DEFAULT_VALUE_LEN];

        // Safety: `value` is large enough for any default GMT writes.
        let status = unsafe { self.api().get_default(handle, keyword.as_ptr(), value.as_mut_ptr()) };
        if status != 0 {
            return Err(BridgeError::DefaultNotFound(name.to_string()));
        }
        // The library NUL-terminates; force a terminator in case it did not.
        value[DEFAULT_VALUE_LEN - 1] = 0;
        let text = unsafe { CStr::from_ptr(value.as_ptr()) };
        Ok(text.to_string_lossy().trim().to_string())
    }

    /// Collect library facts; required keys must resolve, optional ones may be absent.
    pub fn info(&self) -> Result<LibraryInfo> {
        let mut info = LibraryInfo::new();
        for (label, key) in REQUIRED_INFO {
            info.insert(label, self.get_default(key)?);
        }
        for (label, key) in OPTIONAL_INFO {
            if let Ok(value) = self.get_default(key) {
                info.insert(label, value);
            }
        }
        Ok(info)
    }

    /// Reject libraries older than the configured minimum.
    pub(super) fn check_version(&self) -> Result<()> {
        let required = self.config.required_version.trim();
        if required.is_empty() {
            return Ok(());
        }
        let found = self.get_default("API_VERSION")?;
        if parse_version(&found) < parse_version(required) {
            return Err(BridgeError::IncompatibleVersion {
                found,
                required: required.to_string(),
            });
        }
        Ok(())
    }
}

/// Numeric components of a version string (`"6.5.0_abc"` -> `[6, 5, 0]`).
pub fn parse_version(version: &str) -> Vec<u32> {
    version
        .split('.')
        .map_while(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect()
}
