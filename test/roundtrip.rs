//! Round-Trip Integration Tests
//!
//! Host data goes in through an input virtual file, the `write` module
//! copies it into an output virtual file, and the materializer brings it
//! back. What comes out must match what went in.

use std::collections::HashSet;
use std::sync::Arc;

use ndarray::{Array2, Array3};

use gmt_clib::fake::FakeEngine;
use gmt_clib::{
    BridgeError, ColumnarTable, ElementKind, GridType, HostData, OutputKind, Raster, RasterData,
    Registration, Session, TypedBuffer,
};
use gmt_clib::container::MAX_EXACT_INTEGER;

fn session(engine: &Arc<FakeEngine>) -> Session {
    Session::begin(engine.clone(), "roundtrip").unwrap()
}

/// Copy `input` to a fresh output file and return the table read back.
fn copy_table(session: &Session, input: HostData<'_>) -> ColumnarTable {
    let vin = session.virtualfile_in(Some(input), &[], false).unwrap();
    let vout = session.virtualfile_out(OutputKind::Table, None).unwrap();
    session
        .call_module("write", format!("{} ->{}", vin, vout))
        .unwrap();
    vout.to_table(true).unwrap().unwrap()
}

fn copy_raster(session: &Session, raster: &Raster, kind: OutputKind) -> Raster {
    let vin = session
        .virtualfile_in(Some(HostData::Raster(raster)), &[], false)
        .unwrap();
    let vout = session.virtualfile_out(kind, None).unwrap();
    session
        .call_module("write", [vin.name(), vout.name()])
        .unwrap();
    vout.to_raster(kind).unwrap()
}

#[test]
fn test_every_numeric_kind() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let expected = vec![0.0, 1.0, 2.0, 100.0];

    let buffers = vec![
        TypedBuffer::from(vec![0i8, 1, 2, 100]),
        TypedBuffer::from(vec![0i16, 1, 2, 100]),
        TypedBuffer::from(vec![0i32, 1, 2, 100]),
        TypedBuffer::from(vec![0i64, 1, 2, 100]),
        TypedBuffer::from(vec![0u8, 1, 2, 100]),
        TypedBuffer::from(vec![0u16, 1, 2, 100]),
        TypedBuffer::from(vec![0u32, 1, 2, 100]),
        TypedBuffer::from(vec![0u64, 1, 2, 100]),
        TypedBuffer::from(vec![0.0f32, 1.0, 2.0, 100.0]),
        TypedBuffer::from(vec![0.0f64, 1.0, 2.0, 100.0]),
    ];
    let kinds: HashSet<ElementKind> = buffers.iter().map(TypedBuffer::kind).collect();
    assert_eq!(kinds.len(), ElementKind::SUPPORTED.len() - 1);

    for buffer in &buffers {
        let table = copy_table(&session, HostData::Array(buffer));
        assert_eq!(table.n_columns(), 1, "{}", buffer.kind());
        assert_eq!(
            table.column("0").and_then(TypedBuffer::to_f64_vec),
            Some(expected.clone()),
            "{}",
            buffer.kind()
        );
    }
    assert!(session.open_virtualfiles().is_empty());
}

#[test]
fn test_extreme_values_are_bit_exact() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let edge = 1i64 << 53;

    let buffers = vec![
        TypedBuffer::from(vec![i8::MIN, -1, 0, i8::MAX]),
        TypedBuffer::from(vec![i16::MIN, -1, 0, i16::MAX]),
        TypedBuffer::from(vec![i32::MIN, -1, 0, i32::MAX]),
        TypedBuffer::from(vec![-edge, -1, edge - 1, edge]),
        TypedBuffer::from(vec![0u8, 1, 254, u8::MAX]),
        TypedBuffer::from(vec![0u16, 1, 65534, u16::MAX]),
        TypedBuffer::from(vec![0u32, 1, u32::MAX - 1, u32::MAX]),
        TypedBuffer::from(vec![0u64, 1, MAX_EXACT_INTEGER - 1, MAX_EXACT_INTEGER]),
        TypedBuffer::from(vec![-0.0f32, f32::MIN_POSITIVE / 4.0, f32::MAX, f32::NAN, f32::NEG_INFINITY]),
        TypedBuffer::from(vec![-0.0f64, 5e-324, f64::MIN, f64::NAN, f64::INFINITY]),
    ];

    for buffer in &buffers {
        let expected: Vec<u64> = buffer.to_f64_vec().unwrap().iter().map(|v| v.to_bits()).collect();
        let table = copy_table(&session, HostData::Array(buffer));
        let got: Vec<u64> = table
            .column("0")
            .and_then(TypedBuffer::to_f64_vec)
            .unwrap()
            .iter()
            .map(|v| v.to_bits())
            .collect();
        assert_eq!(got, expected, "{}", buffer.kind());
    }
}

#[test]
fn test_integers_beyond_double_precision_rejected() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    for buffer in [
        TypedBuffer::from(vec![(1i64 << 53) + 1, 0]),
        TypedBuffer::from(vec![i64::MAX, 0]),
        TypedBuffer::from(vec![u64::MAX, 0]),
    ] {
        let err = session
            .virtualfile_in(Some(HostData::Array(&buffer)), &[], false)
            .unwrap_err();
        assert!(matches!(err, BridgeError::InexactValue { .. }), "{}", err);
    }
    assert_eq!(engine.calls("GMT_Create_Data"), 0);
}

#[test]
fn test_table_with_text_columns() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let table = ColumnarTable::new()
        .with_column("lon", vec![10.5f64, 11.5].into())
        .unwrap()
        .with_column("name", vec!["north", "south"].into())
        .unwrap()
        .with_column("lat", vec![-3i32, 4].into())
        .unwrap()
        .with_column("note", vec!["a", "b c"].into())
        .unwrap();

    let out = copy_table(&session, HostData::Table(&table));
    assert_eq!(out.names(), vec!["0", "1", "2"]);
    assert_eq!(out.column("0").and_then(TypedBuffer::to_f64_vec), Some(vec![10.5, 11.5]));
    assert_eq!(out.column("1").and_then(TypedBuffer::to_f64_vec), Some(vec![-3.0, 4.0]));
    assert_eq!(out.column("2").and_then(TypedBuffer::as_text), Some(vec!["north a", "south b c"]));
}

#[test]
fn test_matrix_roundtrip() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let matrix = TypedBuffer::matrix(3, 2, vec![1u16, 2, 3, 4, 5, 6]).unwrap();
    let table = copy_table(&session, HostData::Array(&matrix));
    assert_eq!(table.n_rows(), 3);
    assert_eq!(table.column("0").and_then(TypedBuffer::to_f64_vec), Some(vec![1.0, 3.0, 5.0]));
    assert_eq!(table.column("1").and_then(TypedBuffer::to_f64_vec), Some(vec![2.0, 4.0, 6.0]));
}

#[test]
fn test_grid_roundtrip() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let values = Array2::from_shape_vec((3, 4), (0..12).map(|v| v as f32 * 0.5).collect()).unwrap();
    let grid = Raster::grid(values, vec![-2.0, -1.0, 0.0, 1.0], vec![10.0, 10.5, 11.0]).unwrap();

    let back = copy_raster(&session, &grid, OutputKind::Grid);
    assert_eq!(back, grid);
    assert_eq!(back.registration, Registration::Gridline);
    assert_eq!(back.gtype, GridType::Cartesian);
}

#[test]
fn test_geographic_pixel_grid() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let values = Array2::from_shape_vec((2, 2), vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
    let grid = Raster::grid(values, vec![0.5, 1.5], vec![40.5, 41.5])
        .unwrap()
        .with_registration(Registration::Pixel)
        .with_gtype(GridType::Geographic);

    let back = copy_raster(&session, &grid, OutputKind::Grid);
    assert_eq!(back.x, vec![0.5, 1.5]);
    assert_eq!(back.y, vec![40.5, 41.5]);
    assert_eq!(back.registration, Registration::Pixel);
    assert_eq!(back.gtype, GridType::Geographic);
    assert_eq!(back.region().unwrap(), [0.0, 2.0, 40.0, 42.0]);
    match &back.data {
        RasterData::Grid(data) => assert_eq!(data[[0, 1]], 2.0),
        RasterData::Image(_) => panic!("expected a grid"),
    }
}

#[test]
fn test_image_roundtrip() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let values = Array3::from_shape_vec((3, 2, 3), (0..18u8).collect()).unwrap();
    let image = Raster::image(values, vec![0.0, 1.0, 2.0], vec![5.0, 6.0]).unwrap();

    let back = copy_raster(&session, &image, OutputKind::Image);
    assert_eq!(back.n_bands(), 3);
    assert_eq!(back, image);
}

#[test]
fn test_raster_needs_raster_kind() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let out = session.virtualfile_out(OutputKind::Grid, None).unwrap();
    assert!(matches!(out.to_raster(OutputKind::Table), Err(BridgeError::InvalidArgument(_))));
    assert!(matches!(out.to_raster(OutputKind::Grid), Err(BridgeError::EmptyResult(_))));
}

#[test]
fn test_unfilled_output() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let out = session.virtualfile_out(OutputKind::Table, None).unwrap();
    assert!(out.to_table(false).unwrap().is_none());
    assert!(matches!(out.to_table(true), Err(BridgeError::EmptyResult(_))));
}

#[test]
fn test_inputs_are_not_outputs() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let x = TypedBuffer::from(vec![1.0f64]);
    let vin = session.virtualfile_in(None, &[&x], false).unwrap();
    assert!(matches!(vin.to_table(false), Err(BridgeError::NotAnOutput(_))));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let vout = session.virtualfile_out(OutputKind::Table, Some(path.as_path())).unwrap();
    assert!(matches!(vout.to_table(false), Err(BridgeError::NotAnOutput(_))));
}

#[test]
fn test_many_files_and_partial_release() {
    let engine = Arc::new(FakeEngine::new());
    let session = session(&engine);
    let columns: Vec<TypedBuffer> = (0..6).map(|i| TypedBuffer::from(vec![i as f64; 2])).collect();
    let mut inputs: Vec<_> = columns
        .iter()
        .map(|c| session.virtualfile_in(None, &[c], false).unwrap())
        .collect();

    let names: HashSet<String> = inputs.iter().map(|f| f.name().to_string()).collect();
    assert_eq!(names.len(), 6);

    let released = inputs.remove(2);
    let released_name = released.name().to_string();
    released.close().unwrap();

    for (i, input) in inputs.iter().enumerate() {
        let expected = (if i < 2 { i } else { i + 1 }) as f64;
        let out = session.virtualfile_out(OutputKind::Table, None).unwrap();
        session
            .call_module("write", format!("{} ->{}", input, out))
            .unwrap();
        let table = out.to_table(true).unwrap().unwrap();
        assert_eq!(table.column("0").and_then(TypedBuffer::to_f64_vec), Some(vec![expected; 2]));
    }

    let out = session.virtualfile_out(OutputKind::Table, None).unwrap();
    let err = session
        .call_module("write", format!("{} ->{}", released_name, out))
        .unwrap_err();
    assert!(matches!(err, BridgeError::StaleVirtualFile(ref n) if *n == released_name));
}

#[test]
fn test_results_outlive_the_session() {
    let engine = Arc::new(FakeEngine::new());
    let table = {
        let session = session(&engine);
        let x = TypedBuffer::from(vec![7.0f64, 8.0]);
        copy_table(&session, HostData::Array(&x))
    };
    assert_eq!(engine.live_sessions(), 0);
    assert_eq!(table.column("0").and_then(TypedBuffer::to_f64_vec), Some(vec![7.0, 8.0]));
}
