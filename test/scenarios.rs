//! End-to-End Scenarios
//!
//! Complete workflows against the in-memory engine, including the failure
//! paths a caller is expected to rely on.

use std::sync::Arc;

use gmt_clib::container::{BaseFamily, ModeKind, Via};
use gmt_clib::fake::FakeEngine;
use gmt_clib::{
    with_session, BridgeError, DataFamily, DataRequest, Geometry, HostData, OutputKind, Session,
    TypedBuffer,
};

#[test]
fn test_vectors_written_to_file() {
    let engine = Arc::new(FakeEngine::new());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.txt");

    with_session(engine.clone(), "s1", |session| {
        assert_eq!(engine.session_names(), vec!["s1".to_string()]);
        let family = "GMT_IS_DATASET|GMT_VIA_VECTOR";
        let request = DataRequest::new(family, "GMT_IS_POINT", "GMT_CONTAINER_ONLY").dims(3, 5);
        let container = session.create_data(&request)?;
        let columns = [
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0],
            vec![6.0, 7.0, 8.0, 9.0, 10.0],
            vec![11.0, 12.0, 13.0, 14.0, 15.0],
        ];
        for (index, values) in columns.into_iter().enumerate() {
            container.put_vector(index, &TypedBuffer::from(values))?;
        }

        let vin = session.open_virtualfile(family, "GMT_IS_POINT", "GMT_IN|GMT_IS_REFERENCE", Some(container))?;
        let vout = session.virtualfile_out(OutputKind::Table, Some(path.as_path()))?;
        session.call_module("write", format!("{} {}", vin, vout))
    })
    .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<Vec<f64>> = text
        .lines()
        .map(|line| line.split_whitespace().map(|v| v.parse().unwrap()).collect())
        .collect();
    assert_eq!(rows.len(), 5);
    for (r, row) in rows.iter().enumerate() {
        let r = r as f64;
        assert_eq!(row, &vec![1.0 + r, 6.0 + r, 11.0 + r]);
    }
    assert_eq!(engine.live_sessions(), 0);
}

#[test]
fn test_bogus_family_makes_no_native_allocation() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "bogus").unwrap();
    let err = session
        .create_data(&DataRequest::new("BOGUS_FAMILY", "GMT_IS_POINT", "GMT_CONTAINER_ONLY").dims(1, 1))
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidFamily(ref f) if f == "BOGUS_FAMILY"));
    assert_eq!(engine.calls("GMT_Create_Data"), 0);
    assert_eq!(engine.live_objects(), 0);
}

#[test]
fn test_missing_file_reports_log() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "missing").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.txt");
    let out = session.virtualfile_out(OutputKind::Table, None).unwrap();

    let err = session
        .call_module("write", format!("{} ->{}", missing.display(), out))
        .unwrap_err();
    match &err {
        BridgeError::ModuleCallFailed { module, status, log } => {
            assert_eq!(module, "write");
            assert_ne!(*status, 0);
            assert!(!log.is_empty());
            assert!(log.to_lowercase().contains("error"));
            assert!(log.contains("does-not-exist.txt"));
        }
        other => panic!("expected ModuleCallFailed, got {}", other),
    }
    assert_eq!(err.status(), Some(16));
    assert!(err.to_string().contains("status code 16"));

    // The scratch log is gone and the session is still usable.
    assert!(session.call_module("echo", "still alive").is_ok());
}

#[test]
fn test_create_fails_only_with_factory_errors() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "grid").unwrap();

    let mut families = Vec::new();
    for base in BaseFamily::ALL {
        families.push(DataFamily::new(base));
        families.push(DataFamily::via(base, Via::Vector));
        families.push(DataFamily::via(base, Via::Matrix));
    }

    let mut created = 0;
    for family in &families {
        let family = family.to_string();
        for geometry in Geometry::ALL {
            for mode in ModeKind::ALL {
                for sized in [false, true] {
                    let mut request = DataRequest::new(&family, geometry.constant(), mode.constant());
                    if sized {
                        request = request.dims(2, 2);
                    }
                    match session.create_data(&request) {
                        Ok(_) => created += 1,
                        Err(
                            BridgeError::InvalidFamily(_)
                            | BridgeError::InvalidGeometry(_)
                            | BridgeError::InvalidMode(_)
                            | BridgeError::ContainerCreateFailed { .. },
                        ) => {}
                        Err(other) => panic!("{} / {:?} / {:?}: unexpected {}", family, geometry, mode, other),
                    }
                }
            }
        }
    }
    assert!(created > 0);
    assert_eq!(engine.live_objects(), 0);
}

#[test]
fn test_shape_mismatch_is_local() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "shapes").unwrap();
    let request = DataRequest::new("GMT_IS_VECTOR", "GMT_IS_POINT", "GMT_CONTAINER_ONLY").dims(2, 4);
    let container = session.create_data(&request).unwrap();
    let calls = engine.total_calls();

    for len in [0usize, 1, 3, 5, 16] {
        let buffer = TypedBuffer::from(vec![0.0f64; len]);
        assert!(
            matches!(container.put_vector(0, &buffer), Err(BridgeError::ShapeMismatch { .. })),
            "length {}",
            len
        );
    }
    for column in [2usize, 3, 100] {
        let buffer = TypedBuffer::from(vec![0.0f64; 4]);
        assert!(matches!(
            container.put_vector(column, &buffer),
            Err(BridgeError::ColumnOutOfRange { .. })
        ));
    }
    assert_eq!(engine.calls("GMT_Put_Vector"), 0);
    assert_eq!(engine.total_calls(), calls);
}

#[test]
fn test_stale_file_in_token_list() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "stale").unwrap();
    let x = TypedBuffer::from(vec![1.0f64, 2.0]);
    let vin = session.virtualfile_in(None, &[&x], false).unwrap();
    let name = vin.name().to_string();
    vin.close().unwrap();

    let before = engine.calls("GMT_Call_Module");
    let err = session
        .call_module("write", vec![name.clone(), "out.txt".to_string()])
        .unwrap_err();
    assert!(matches!(err, BridgeError::StaleVirtualFile(ref n) if *n == name));
    assert_eq!(engine.calls("GMT_Call_Module"), before);
}

#[test]
fn test_bool_input_rejected() {
    let engine = Arc::new(FakeEngine::new());
    let session = Session::begin(engine.clone(), "bools").unwrap();
    let flags = TypedBuffer::from(vec![true, false]);
    let err = session
        .virtualfile_in(Some(HostData::Array(&flags)), &[], false)
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedDType(ref k) if k == "bool"));
    assert_eq!(engine.calls("GMT_Create_Data"), 0);
}
