//! Bridge Errors
//!
//! One error type for every layer of the bridge. Variants that originate in
//! the native library always carry the native status code.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors raised by the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    // =========================================================================
    // Library Loader
    // =========================================================================
    #[error("GMT library not found; tried: {}", format_attempts(.attempts))]
    LibraryNotFound { attempts: Vec<(PathBuf, String)> },

    #[error("GMT library '{}' is missing required symbol '{symbol}'", .path.display())]
    LibraryInvalid { path: PathBuf, symbol: String },

    #[error("GMT library version {found} is older than the required {required}")]
    IncompatibleVersion { found: String, required: String },

    // =========================================================================
    // Type Registry
    // =========================================================================
    #[error("Constant '{0}' is not defined by the GMT library")]
    UnknownConstant(String),

    #[error("Default parameter '{0}' could not be read")]
    DefaultNotFound(String),

    // =========================================================================
    // Session
    // =========================================================================
    #[error("No currently active GMT API session")]
    NoActiveSession,

    #[error("Failed to create GMT API session '{name}': {reason}")]
    SessionCreateFailed { name: String, reason: String },

    #[error("Failed to destroy GMT API session '{name}' (status {status})")]
    SessionDestroyFailed { name: String, status: i32 },

    // =========================================================================
    // Container Factory
    // =========================================================================
    #[error("Invalid data family '{0}'")]
    InvalidFamily(String),

    #[error("Invalid geometry '{0}'")]
    InvalidGeometry(String),

    #[error("Invalid creation mode '{0}'")]
    InvalidMode(String),

    #[error("Invalid grid registration '{0}'")]
    InvalidRegistration(String),

    #[error("GMT_Create_Data returned a null container for family {family}")]
    ContainerCreateFailed { family: String },

    #[error("GMT_Destroy_Data failed for family {family} (status {status})")]
    ContainerDestroyFailed { family: String, status: i32 },

    // =========================================================================
    // Data Ingestion
    // =========================================================================
    #[error("Unsupported element type '{0}'")]
    UnsupportedDType(String),

    #[error("Column {column} is out of range for a container with {n_columns} columns")]
    ColumnOutOfRange { column: usize, n_columns: usize },

    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    #[error("Expected a {expected}-D array, got {got}-D")]
    InvalidRank { expected: usize, got: usize },

    #[error("Value {value} of kind {kind} has no exact double representation")]
    InexactValue { kind: String, value: String },

    #[error("Failed to put {what} into container (status {status})")]
    PutFailed { what: &'static str, status: i32 },

    #[error("No input data was supplied")]
    NoInputData,

    // =========================================================================
    // Virtual File Registry
    // =========================================================================
    #[error("Invalid virtual file direction '{0}'")]
    InvalidDirection(String),

    #[error("Failed to open virtual file (status {status})")]
    VirtualFileOpenFailed { status: i32 },

    #[error("Failed to close virtual file '{name}' (status {status})")]
    VirtualFileCloseFailed { name: String, status: i32 },

    #[error("Virtual file '{0}' has already been released")]
    StaleVirtualFile(String),

    #[error("Virtual file '{0}' does not hold native output")]
    NotAnOutput(String),

    // =========================================================================
    // Module Invoker
    // =========================================================================
    #[error("Module '{module}' failed with status code {status}:\n{log}")]
    ModuleCallFailed {
        module: String,
        status: i32,
        log: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to redirect library messages to '{}' (status {status})", .path.display())]
    LogRedirectFailed { path: PathBuf, status: i32 },

    // =========================================================================
    // Result Materializer
    // =========================================================================
    #[error("Module produced no output in '{0}'")]
    EmptyResult(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Native status code carried by this error, if it came from the library.
    pub fn status(&self) -> Option<i32> {
        match self {
            BridgeError::SessionDestroyFailed { status, .. }
            | BridgeError::ContainerDestroyFailed { status, .. }
            | BridgeError::PutFailed { status, .. }
            | BridgeError::VirtualFileOpenFailed { status }
            | BridgeError::VirtualFileCloseFailed { status, .. }
            | BridgeError::ModuleCallFailed { status, .. }
            | BridgeError::LogRedirectFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn format_attempts(attempts: &[(PathBuf, String)]) -> String {
    if attempts.is_empty() {
        return "no candidates".to_string();
    }
    attempts
        .iter()
        .map(|(path, reason)| format!("{} ({})", path.display(), reason))
        .collect::<Vec<_>>()
        .join("; ")
}
