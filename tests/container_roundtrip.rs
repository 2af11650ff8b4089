//! Integration tests for writing MTC time courses and reading them back.

use std::sync::Arc;

use glam::DVec3;
use lobulus::mesh::{AttributeArray, AttributeMap, CellBlock, CellType, Mesh, MeshSnapshot};
use lobulus::mtc::{payload_path_for, TimeSeriesReader, TimeSeriesWriter};
use lobulus::series::{AttributeCatalog, AttributeKind};
use lobulus::Error;

fn quad_mesh() -> Mesh {
    let points = vec![
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(1.0, 1.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
    ];
    let block = CellBlock::new(CellType::Triangle, vec![0, 1, 2, 0, 2, 3]).expect("block");
    Mesh::new(points, vec![block]).expect("mesh")
}

fn scalar_map(name: &str, values: Vec<f64>) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(name.to_string(), AttributeArray::scalar(values));
    map
}

#[test]
fn test_roundtrip_topology_and_steps() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("run.mtc");

    let mesh = quad_mesh();
    {
        let mut writer = TimeSeriesWriter::create(&path).expect("create");
        writer.write_topology(&mesh).expect("topology");

        let mut point_data = scalar_map("pressure", vec![1.0, 2.0, 3.0, 4.0]);
        point_data.insert(
            "velocity".to_string(),
            AttributeArray::new(vec![0.0; 12], 3).expect("vector"),
        );
        let cell_data = scalar_map("glc", vec![0.5, 0.25]);

        writer.write_step(0.0, &point_data, &cell_data).expect("step 0");

        let mut point_data = scalar_map("pressure", vec![2.0, 3.0, 4.0, 5.0]);
        point_data.insert(
            "velocity".to_string(),
            AttributeArray::new(vec![1.0; 12], 3).expect("vector"),
        );
        let cell_data = scalar_map("glc", vec![0.75, 0.5]);
        writer.write_step(10.0, &point_data, &cell_data).expect("step 1");

        writer.finish().expect("finish");
    }

    // payload is colocated under the derived name
    assert!(payload_path_for(&path).exists());

    let reader = TimeSeriesReader::open(&path).expect("open");
    assert_eq!(reader.num_steps(), 2);
    assert_eq!(reader.times(), &[0.0, 10.0]);

    let topology = reader.read_topology().expect("topology");
    assert_eq!(topology.num_points(), 4);
    assert_eq!(topology.num_cells(), 2);
    assert_eq!(topology.points()[2], DVec3::new(1.0, 1.0, 0.0));
    assert_eq!(topology.blocks()[0].cell_type(), CellType::Triangle);
    assert_eq!(topology.blocks()[0].cell(1), &[0, 2, 3]);

    let (point_data, cell_data) = reader.read_step(0).expect("read step 0");
    assert_eq!(
        point_data["pressure"].as_scalar().expect("scalar"),
        &[1.0, 2.0, 3.0, 4.0]
    );
    assert_eq!(point_data["velocity"].components(), 3);
    assert_eq!(cell_data["glc"].as_scalar().expect("scalar"), &[0.5, 0.25]);

    let (point_data, _) = reader.read_step(1).expect("read step 1");
    assert_eq!(
        point_data["pressure"].as_scalar().expect("scalar"),
        &[2.0, 3.0, 4.0, 5.0]
    );
}

#[test]
fn test_step_out_of_bounds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("run.mtc");

    let mut writer = TimeSeriesWriter::create(&path).expect("create");
    writer.write_topology(&quad_mesh()).expect("topology");
    writer
        .write_step(0.0, &AttributeMap::new(), &AttributeMap::new())
        .expect("step");
    writer.finish().expect("finish");

    let reader = TimeSeriesReader::open(&path).expect("open");
    let err = reader.read_step(3).unwrap_err();
    assert!(matches!(err, Error::StepOutOfBounds { index: 3, count: 1 }));
}

#[test]
fn test_from_snapshots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("course.mtc");

    let mesh = Arc::new(quad_mesh());
    let snapshots: Vec<MeshSnapshot> = (0..3)
        .map(|k| {
            let value = k as f64;
            MeshSnapshot::new(
                Arc::clone(&mesh),
                AttributeMap::new(),
                scalar_map("necrosis", vec![value, value + 0.5]),
                value * 10.0,
            )
            .expect("snapshot")
        })
        .collect();

    TimeSeriesWriter::from_snapshots(&path, snapshots).expect("from_snapshots");

    let reader = TimeSeriesReader::open(&path).expect("open");
    assert_eq!(reader.times(), &[0.0, 10.0, 20.0]);
    let snapshot = reader.read_snapshot(2).expect("snapshot");
    assert_eq!(snapshot.time(), 20.0);
    assert_eq!(
        snapshot.cell_data()["necrosis"].as_scalar().expect("scalar"),
        &[2.0, 2.5]
    );
}

#[test]
fn test_catalog_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("run.mtc");

    let mut writer = TimeSeriesWriter::create(&path).expect("create");
    writer.write_topology(&quad_mesh()).expect("topology");

    let mut point_data = scalar_map("pressure", vec![0.0; 4]);
    point_data.insert(
        "displacement".to_string(),
        AttributeArray::new(vec![0.0; 12], 3).expect("vector"),
    );
    let cell_data = scalar_map("glc", vec![0.0; 2]);
    writer.write_step(5.0, &point_data, &cell_data).expect("step 0");
    writer.write_step(7.5, &point_data, &cell_data).expect("step 1");
    writer.write_step(20.0, &point_data, &cell_data).expect("step 2");
    writer.finish().expect("finish");

    let catalog = AttributeCatalog::build(&path).expect("catalog");
    assert_eq!(catalog.step_count, 3);
    assert_eq!(catalog.time_start, 5.0);
    assert_eq!(catalog.time_end, 20.0);
    assert_eq!(catalog.point_count, 4);
    assert_eq!(catalog.cell_count, 2);

    assert_eq!(
        catalog.point_attributes["pressure"].kind,
        AttributeKind::Scalar
    );
    assert_eq!(
        catalog.point_attributes["displacement"].kind,
        AttributeKind::Vector
    );
    assert_eq!(catalog.cell_attributes["glc"].kind, AttributeKind::Scalar);

    let scalars: Vec<&str> = catalog.scalar_names().collect();
    assert_eq!(scalars, vec!["pressure", "glc"]);
}

#[test]
fn test_open_missing_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = TimeSeriesReader::open(dir.path().join("absent.mtc")).unwrap_err();
    assert!(matches!(err, Error::SourceUnreadable { .. }));
}
