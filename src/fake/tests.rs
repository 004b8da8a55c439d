//! In-Memory Engine Tests

use std::ffi::CString;
use std::sync::Arc;

use super::*;
use crate::error::BridgeError;
use crate::ffi::abi::GMT_NOTSET;
use crate::session::Session;

fn enum_value(engine: &FakeEngine, name: &str) -> c_int {
    let name = CString::new(name).unwrap();
    unsafe { engine.get_enum(std::ptr::null_mut(), name.as_ptr()) }
}

#[test]
fn test_constant_table() {
    let engine = FakeEngine::new();
    assert_eq!(enum_value(&engine, "GMT_IS_DATASET"), 0);
    assert_eq!(enum_value(&engine, "GMT_IS_GRID"), 1);
    assert_eq!(enum_value(&engine, "GMT_VIA_MATRIX"), 200);
    assert_eq!(enum_value(&engine, "GMT_IS_SURFACE"), 8);
    assert_eq!(enum_value(&engine, "GMT_DOUBLE"), 9);
    assert_eq!(enum_value(&engine, "GMT_NOT_A_THING"), GMT_NOTSET);
    assert_eq!(engine.calls("GMT_Get_Enum"), 6);
}

#[test]
fn test_unknown_session_handle() {
    let engine = FakeEngine::new();
    let bogus = 4242usize as *mut c_void;
    assert_eq!(unsafe { engine.destroy_session(bogus) }, STATUS_NOT_A_SESSION);
    let module = CString::new("echo").unwrap();
    let args = CString::new("hi").unwrap();
    let status = unsafe { engine.call_module(bogus, module.as_ptr(), MODULE_CMD, args.as_ptr() as *mut c_void) };
    assert_eq!(status, STATUS_NOT_A_SESSION);
}

#[test]
fn test_session_bookkeeping() {
    let engine = Arc::new(FakeEngine::new());
    let a = Session::begin(engine.clone(), "alpha").unwrap();
    let b = Session::begin(engine.clone(), "beta").unwrap();
    assert_eq!(engine.live_sessions(), 2);
    assert_eq!(engine.session_names(), vec!["alpha".to_string(), "beta".to_string()]);
    a.close().unwrap();
    assert_eq!(engine.session_names(), vec!["beta".to_string()]);
    b.close().unwrap();
    assert_eq!(engine.live_sessions(), 0);
}

#[test]
fn test_module_call_recorded() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "calls").unwrap();

    session.call_module("echo", "-V one two").unwrap();
    let call = engine.last_call().unwrap();
    assert_eq!(call.module, "echo");
    assert_eq!(call.mode, MODULE_CMD);
    assert_eq!(call.args, vec!["-V", "one", "two"]);

    session.call_module("echo", ["a b", "c"]).unwrap();
    let call = engine.last_call().unwrap();
    assert_eq!(call.mode, 2);
    assert_eq!(call.args, vec!["a b", "c"]);

    session.call_module("echo", Vec::<String>::new()).unwrap();
    let call = engine.last_call().unwrap();
    assert_eq!(call.mode, MODULE_CMD);
    assert!(call.args.is_empty());
}

#[test]
fn test_unknown_module_logs_error() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "unknown").unwrap();
    match session.call_module("nosuchmodule", "") {
        Err(BridgeError::ModuleCallFailed { module, status, log }) => {
            assert_eq!(module, "nosuchmodule");
            assert_eq!(status, modules::STATUS_NOT_A_VALID_MODULE);
            assert!(log.contains("[ERROR]"));
            assert!(log.contains("nosuchmodule"));
        }
        other => panic!("expected a module failure, got {:?}", other.err()),
    }
}

#[test]
fn test_log_redirect_is_one_shot() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "logs").unwrap();
    let handle = session.handle().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("echo.log");
    let module = CString::new("echo").unwrap();
    let echo = |text: &str| {
        let args = CString::new(text).unwrap();
        unsafe { engine.call_module(handle, module.as_ptr(), MODULE_CMD, args.as_ptr() as *mut c_void) }
    };

    let (status, log) = session.log_to_file(Some(path.as_path()), || echo("first")).unwrap();
    assert_eq!(status, 0);
    assert_eq!(log, "echo [INFORMATION]: first\n");

    // Only the first call after the redirect is captured.
    assert_eq!(echo("second"), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "echo [INFORMATION]: first\n");
}

#[test]
fn test_log_with_invalid_utf8_is_kept() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "bytes").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.log");
    let (_, log) = session
        .log_to_file(Some(path.as_path()), || {
            std::fs::write(&path, b"write [ERROR]: Cannot find file \xff\xfe.txt\n").unwrap()
        })
        .unwrap();
    assert!(log.starts_with("write [ERROR]: Cannot find file "));
    assert!(log.contains('\u{FFFD}'));
}

#[test]
fn test_bad_log_mode_rejected() {
    let engine = FakeEngine::new();
    let tag = CString::new("logs").unwrap();
    let handle = unsafe { engine.create_session(tag.as_ptr(), 2, 2, None) };
    assert!(!handle.is_null());
    let status = unsafe { engine.handle_messages(handle, 7, IS_FILE, std::ptr::null_mut()) };
    assert_eq!(status, STATUS_BAD_ARGUMENT);
    assert_eq!(unsafe { engine.handle_messages(handle, LOG_OFF, IS_FILE, std::ptr::null_mut()) }, 0);
    assert_eq!(unsafe { engine.destroy_session(handle) }, 0);
}

#[test]
fn test_read_unknown_virtualfile() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "reads").unwrap();
    let handle = session.handle().unwrap();
    let name = CString::new("@GMTAPI@-999999").unwrap();
    assert!(unsafe { engine.read_virtualfile(handle, name.as_ptr()) }.is_null());
}

#[test]
fn test_write_between_files() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "files").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.txt");
    let target = dir.path().join("out.txt");
    std::fs::write(&source, "# header\n1 2 first\n3 4 second\n").unwrap();

    session
        .call_module("write", vec![source.display().to_string(), target.display().to_string()])
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(&target).unwrap(),
        "1\t2\tfirst\n3\t4\tsecond\n"
    );
}

#[test]
fn test_write_needs_two_files() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "args").unwrap();
    let err = session.call_module("write", "-Vl only.txt").unwrap_err();
    assert_eq!(err.status(), Some(STATUS_BAD_ARGUMENT));
}
