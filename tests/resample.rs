//! Integration tests for time-course resampling.

use glam::DVec3;
use lobulus::mesh::{AttributeArray, AttributeMap, CellBlock, CellType, Mesh};
use lobulus::mtc::{payload_path_for, TimeSeriesReader, TimeSeriesWriter};
use lobulus::series::resample;
use lobulus::Error;

fn bar_mesh() -> Mesh {
    let points = vec![
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(2.0, 0.0, 0.0),
    ];
    let block = CellBlock::new(CellType::Line, vec![0, 1, 1, 2]).expect("block");
    Mesh::new(points, vec![block]).expect("mesh")
}

/// Time course with a point scalar and a cell scalar, both ramping
/// linearly over the given (time, value) samples.
fn write_ramp(path: &std::path::Path, samples: &[(f64, f64)]) {
    let mut writer = TimeSeriesWriter::create(path).expect("create");
    writer.write_topology(&bar_mesh()).expect("topology");

    for &(time, value) in samples {
        let mut point_data = AttributeMap::new();
        point_data.insert(
            "pressure".to_string(),
            AttributeArray::scalar(vec![value, value + 1.0, value + 2.0]),
        );
        let mut cell_data = AttributeMap::new();
        cell_data.insert(
            "glc".to_string(),
            AttributeArray::scalar(vec![value, value * 2.0]),
        );
        writer.write_step(time, &point_data, &cell_data).expect("step");
    }
    writer.finish().expect("finish");
}

#[test]
fn test_linear_ramp_midpoint() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("run.mtc");
    let out = dir.path().join("run_interpolated.mtc");

    write_ramp(&source, &[(0.0, 0.0), (10.0, 100.0)]);
    resample(&source, &[2.5], &out).expect("resample");

    let reader = TimeSeriesReader::open(&out).expect("open");
    assert_eq!(reader.times(), &[2.5]);

    let (point_data, cell_data) = reader.read_step(0).expect("step");
    let pressure = point_data["pressure"].as_scalar().expect("scalar");
    assert!((pressure[0] - 25.0).abs() < 1e-12);

    // cell data uses the same weights as point data
    let glc = cell_data["glc"].as_scalar().expect("scalar");
    assert!((glc[0] - 25.0).abs() < 1e-12);
    assert!((glc[1] - 50.0).abs() < 1e-12);
}

#[test]
fn test_idempotent_on_source_times() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("run.mtc");
    let out = dir.path().join("run_same.mtc");

    let samples = [(0.0, 0.0), (1.0, 3.0), (4.0, -2.0), (9.0, 7.5)];
    write_ramp(&source, &samples);

    let times: Vec<f64> = samples.iter().map(|&(t, _)| t).collect();
    resample(&source, &times, &out).expect("resample");

    let original = TimeSeriesReader::open(&source).expect("open source");
    let resampled = TimeSeriesReader::open(&out).expect("open out");
    assert_eq!(original.times(), resampled.times());

    for k in 0..original.num_steps() {
        let (pd_a, cd_a) = original.read_step(k).expect("source step");
        let (pd_b, cd_b) = resampled.read_step(k).expect("out step");

        for (name, array) in &pd_a {
            let expected = array.data();
            let actual = pd_b[name].data();
            for (a, b) in expected.iter().zip(actual) {
                assert!((a - b).abs() < 1e-12, "point '{name}' step {k}: {a} vs {b}");
            }
        }
        for (name, array) in &cd_a {
            let expected = array.data();
            let actual = cd_b[name].data();
            for (a, b) in expected.iter().zip(actual) {
                assert!((a - b).abs() < 1e-12, "cell '{name}' step {k}: {a} vs {b}");
            }
        }
    }
}

#[test]
fn test_convexity_between_samples() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("run.mtc");
    let out = dir.path().join("run_dense.mtc");

    write_ramp(&source, &[(0.0, -5.0), (2.0, 11.0), (6.0, 3.0)]);
    let targets = [0.5, 1.0, 1.9, 2.0, 3.3, 5.9];
    resample(&source, &targets, &out).expect("resample");

    let source_reader = TimeSeriesReader::open(&source).expect("open source");
    let reader = TimeSeriesReader::open(&out).expect("open out");

    for (k, &t) in targets.iter().enumerate() {
        // bracketing source samples
        let times = source_reader.times();
        let lo = times.iter().rposition(|&x| x <= t).expect("lo");
        let hi = times.iter().position(|&x| x >= t).expect("hi");

        let (_, cd_lo) = source_reader.read_step(lo).expect("lo step");
        let (_, cd_hi) = source_reader.read_step(hi).expect("hi step");
        let (_, cd_out) = reader.read_step(k).expect("out step");

        let a = cd_lo["glc"].data();
        let b = cd_hi["glc"].data();
        let v = cd_out["glc"].data();
        for i in 0..v.len() {
            let (min, max) = (a[i].min(b[i]), a[i].max(b[i]));
            assert!(
                v[i] >= min - 1e-12 && v[i] <= max + 1e-12,
                "t={t}: value {} outside [{min}, {max}]",
                v[i]
            );
        }
    }
}

#[test]
fn test_range_rejection_leaves_no_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("run.mtc");
    write_ramp(&source, &[(0.0, 0.0), (10.0, 100.0)]);

    // below the data range
    let out = dir.path().join("below.mtc");
    let err = resample(&source, &[-1.0, 5.0], &out).unwrap_err();
    assert!(matches!(err, Error::InterpolationRange { .. }));
    assert!(!out.exists());
    assert!(!payload_path_for(&out).exists());

    // above the data range
    let out = dir.path().join("above.mtc");
    let err = resample(&source, &[5.0, 10.5], &out).unwrap_err();
    assert!(matches!(err, Error::InterpolationRange { .. }));
    assert!(!out.exists());
    assert!(!payload_path_for(&out).exists());
}

#[test]
fn test_range_error_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("run.mtc");
    write_ramp(&source, &[(0.0, 0.0), (10.0, 100.0)]);

    let err = resample(&source, &[5.0, 12.0], dir.path().join("out.mtc")).unwrap_err();
    match err {
        Error::InterpolationRange {
            requested_end,
            data_end,
            ..
        } => {
            assert_eq!(requested_end, 12.0);
            assert_eq!(data_end, 10.0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_attribute_set_mismatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("run.mtc");
    let out = dir.path().join("out.mtc");

    // step 1 drops the cell attribute present at step 0
    let mut writer = TimeSeriesWriter::create(&source).expect("create");
    writer.write_topology(&bar_mesh()).expect("topology");
    let mut cell_data = AttributeMap::new();
    cell_data.insert("glc".to_string(), AttributeArray::scalar(vec![1.0, 2.0]));
    writer
        .write_step(0.0, &AttributeMap::new(), &cell_data)
        .expect("step 0");
    writer
        .write_step(1.0, &AttributeMap::new(), &AttributeMap::new())
        .expect("step 1");
    writer.finish().expect("finish");

    let err = resample(&source, &[0.5], &out).unwrap_err();
    assert!(matches!(
        err,
        Error::AttributeSetMismatch { name, step: 1 } if name == "glc"
    ));
    assert!(!out.exists());
    assert!(!payload_path_for(&out).exists());
}
