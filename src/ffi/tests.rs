//! FFI Module Tests

use std::path::{Path, PathBuf};

use super::*;
use crate::error::BridgeError;

#[test]
fn test_element_kind_type_names() {
    assert_eq!(ElementKind::I8.gmt_type(), Some("GMT_CHAR"));
    assert_eq!(ElementKind::U8.gmt_type(), Some("GMT_UCHAR"));
    assert_eq!(ElementKind::I64.gmt_type(), Some("GMT_LONG"));
    assert_eq!(ElementKind::U64.gmt_type(), Some("GMT_ULONG"));
    assert_eq!(ElementKind::F32.gmt_type(), Some("GMT_FLOAT"));
    assert_eq!(ElementKind::F64.gmt_type(), Some("GMT_DOUBLE"));
    assert_eq!(ElementKind::Text.gmt_type(), Some("GMT_TEXT"));
    assert_eq!(ElementKind::Bool.gmt_type(), None);

    for kind in ElementKind::SUPPORTED {
        assert!(kind.gmt_type().is_some(), "{} should have a native type", kind);
    }
}

#[test]
fn test_element_kind_parsing() {
    assert_eq!(ElementKind::parse("float64"), Some(ElementKind::F64));
    assert_eq!(ElementKind::parse("F32"), Some(ElementKind::F32));
    assert_eq!(ElementKind::parse("uint16"), Some(ElementKind::U16));
    assert_eq!(ElementKind::parse("str"), Some(ElementKind::Text));
    assert_eq!(ElementKind::parse("complex128"), None);

    for kind in ElementKind::SUPPORTED {
        assert_eq!(ElementKind::parse(&kind.to_string()), Some(kind));
    }
}

#[test]
fn test_element_kind_properties() {
    assert!(ElementKind::I16.is_numeric());
    assert!(!ElementKind::Text.is_numeric());
    assert!(!ElementKind::Bool.is_numeric());
    assert_eq!(ElementKind::U16.size(), 2);
    assert_eq!(ElementKind::F64.size(), 8);
}

#[test]
fn test_platform_library_names() {
    assert_eq!(clib_names("linux"), vec!["libgmt.so"]);
    assert_eq!(clib_names("freebsd"), vec!["libgmt.so"]);
    assert_eq!(clib_names("macos"), vec!["libgmt.dylib"]);
    assert_eq!(clib_names("windows"), vec!["gmt.dll", "gmt_w64.dll", "gmt_w32.dll"]);
}

#[test]
fn test_candidate_order() {
    let env_dir = std::ffi::OsStr::new("/env/lib");
    let extra = vec![PathBuf::from("/extra/lib")];
    let candidates = clib_full_names(Some(env_dir), &extra);
    let names = clib_names(std::env::consts::OS);

    assert_eq!(candidates[0], Path::new("/env/lib").join(names[0]));
    let extra_at = candidates
        .iter()
        .position(|c| c.starts_with("/extra/lib"))
        .unwrap();
    let bare_at = candidates
        .iter()
        .position(|c| c == Path::new(names[0]))
        .unwrap();
    assert!(extra_at < bare_at);
    assert_eq!(candidates.last().unwrap(), Path::new(names[names.len() - 1]));
}

#[test]
fn test_empty_env_dir_ignored() {
    let candidates = clib_full_names(Some(std::ffi::OsStr::new("")), &[]);
    assert!(candidates.iter().all(|c| !c.starts_with("/env")));
    assert!(!candidates.is_empty());
}

#[test]
fn test_loader_hint_comes_first() {
    let mut loader = LibraryLoader::new().with_hint("/opt/custom/libgmt.so");
    loader.add_search_path("/opt/other");
    let candidates = loader.candidates();
    assert_eq!(candidates[0], PathBuf::from("/opt/custom/libgmt.so"));
    assert!(candidates.iter().any(|c| c.starts_with("/opt/other")));
}

#[test]
fn test_load_missing_library() {
    let result = LibGmt::load("/nonexistent/dir/libgmt.so");
    match result {
        Err(BridgeError::LibraryNotFound { attempts }) => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(attempts[0].0, PathBuf::from("/nonexistent/dir/libgmt.so"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("a missing library must not load"),
    }
}

#[test]
fn test_required_symbols() {
    assert_eq!(REQUIRED_SYMBOLS.len(), 14);
    assert!(REQUIRED_SYMBOLS.contains(&"GMT_Create_Session"));
    assert!(REQUIRED_SYMBOLS.contains(&"GMT_Read_VirtualFile"));
    assert!(REQUIRED_SYMBOLS.iter().all(|s| s.starts_with("GMT_")));
}

#[test]
fn test_grid_header_padding() {
    let header = abi::GmtGridHeader::new(4, 3, [2, 2, 2, 2]);
    assert_eq!(header.mx, 8);
    assert_eq!(header.my, 7);
    assert_eq!(header.nm, 12);
    assert_eq!(header.size, 56);
    assert_eq!(header.n_bands, 1);
}
