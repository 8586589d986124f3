use super::h5::open_hdf5;
use super::{open_container, ContainerFormat};
use crate::engine::DiffEngine;
use crate::walker::UnrecognizedPolicy;
use h5compare_common::{
    ContainerGroup, ContainerObject, DiffKind, DiffRecord, Element, H5CompareError, Side,
    TypeTag, Value, ValueMismatch,
};
use hdf5::types::{FixedAscii, VarLenUnicode};
use hdf5::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes a small tree: attrs on the root, int32/float64/fixed-string
/// datasets, a nested group and a dangling soft link
fn write_sample(path: &Path, middle: i32) {
    let file = File::create(path).unwrap();
    file.new_attr::<i32>().shape(1).create("version").unwrap();

    let x = file.new_dataset::<i32>().shape(3).create("x").unwrap();
    x.write_raw(&vec![1i32, middle, 3]).unwrap();
    x.new_attr::<VarLenUnicode>()
        .shape(1)
        .create("units")
        .unwrap();

    let y = file.new_dataset::<f64>().shape(2).create("y").unwrap();
    y.write_raw(&vec![0.5f64, 1.5]).unwrap();

    let names: Vec<FixedAscii<8>> = ["alpha", "beta"]
        .iter()
        .map(|s| FixedAscii::<8>::from_ascii(s).unwrap())
        .collect();
    let label = file.new_dataset::<FixedAscii<8>>().shape(2).create("label").unwrap();
    label.write_raw(&names).unwrap();

    let g = file.create_group("g").unwrap();
    let z = g.new_dataset::<f64>().shape(1).create("z").unwrap();
    z.write_raw(&vec![2.0f64]).unwrap();

    file.link_soft("/missing", "dangling").unwrap();
}

fn sample(dir: &TempDir, name: &str, middle: i32) -> PathBuf {
    let path = dir.path().join(name);
    write_sample(&path, middle);
    path
}

fn child(group: &dyn ContainerGroup, name: &str) -> ContainerObject {
    group
        .items()
        .unwrap()
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, object)| object)
        .unwrap_or_else(|| panic!("no child named {name}"))
}

#[test]
fn test_reads_types_values_and_attributes() {
    let dir = TempDir::new().unwrap();
    let path = sample(&dir, "a.h5", 2);
    let root = open_hdf5(&path).unwrap();

    assert_eq!(root.attrs().unwrap().get("version"), Some(&TypeTag::Int32));

    match child(&root, "x") {
        ContainerObject::Dataset(x) => {
            assert_eq!(x.dtype().unwrap(), TypeTag::Int32);
            assert_eq!(x.value().unwrap(), Value::array(vec![1i64, 2, 3]));
            assert_eq!(x.attrs().unwrap().get("units"), Some(&TypeTag::String));
        }
        other => panic!("unexpected: {other:?}"),
    }

    match child(&root, "label") {
        ContainerObject::Dataset(label) => {
            assert_eq!(label.dtype().unwrap(), TypeTag::Bytes);
            assert_eq!(
                label.value().unwrap().elements(),
                &[Element::from("alpha"), Element::from("beta")]
            );
        }
        other => panic!("unexpected: {other:?}"),
    }

    match child(&root, "g") {
        ContainerObject::Group(g) => match child(g.as_ref(), "z") {
            ContainerObject::Dataset(z) => {
                assert_eq!(z.dtype().unwrap(), TypeTag::Float64);
                assert_eq!(z.value().unwrap(), Value::array(vec![2.0f64]));
            }
            other => panic!("unexpected: {other:?}"),
        },
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_dangling_link_reports_its_link_type() {
    let dir = TempDir::new().unwrap();
    let path = sample(&dir, "a.h5", 2);
    let root = open_hdf5(&path).unwrap();

    match child(&root, "dangling") {
        ContainerObject::Other { kind } => assert_eq!(kind, "softlink"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_open_container_detects_hdf5() {
    let dir = TempDir::new().unwrap();
    let path = sample(&dir, "a.h5", 2);
    let root = open_container(&path, ContainerFormat::Auto).unwrap();
    assert!(root.items().unwrap().iter().any(|(name, _)| name == "g"));

    let renamed = dir.path().join("a.data");
    std::fs::copy(&path, &renamed).unwrap();
    assert_eq!(super::detect_format(&renamed).unwrap(), ContainerFormat::Hdf5);
}

#[test]
fn test_diff_of_two_files() {
    let dir = TempDir::new().unwrap();
    let a = open_hdf5(&sample(&dir, "a.h5", 2)).unwrap();
    let b = open_hdf5(&sample(&dir, "b.h5", 5)).unwrap();

    let records = DiffEngine::new()
        .with_unrecognized_policy(UnrecognizedPolicy::Skip)
        .diff_to_vec(&a, &b)
        .unwrap();

    assert!(records.contains(&DiffRecord::new(
        "/",
        "x",
        DiffKind::ValueMismatch(ValueMismatch::Elementwise {
            mismatch_count: 1,
            total_count: 3,
            indices: vec![vec![1]],
            values_a: vec![Element::Int(2)],
            values_b: vec![Element::Int(5)],
        }),
    )));
    for side in [Side::A, Side::B] {
        assert!(records.contains(&DiffRecord::new(
            "/",
            "dangling",
            DiffKind::UnrecognizedKind {
                side,
                kind: "softlink".to_string(),
            },
        )));
    }
    assert!(records.contains(&DiffRecord::new("/", "label", DiffKind::ValueEqual)));
    assert!(records.contains(&DiffRecord::new("/g/", "z", DiffKind::ValueEqual)));
    assert!(records.iter().all(|r| !matches!(
        r.kind,
        DiffKind::UniqueToA | DiffKind::UniqueToB | DiffKind::DtypeMismatch { .. }
    )));
}

#[test]
fn test_dangling_link_aborts_by_default() {
    let dir = TempDir::new().unwrap();
    let a = open_hdf5(&sample(&dir, "a.h5", 2)).unwrap();
    let b = open_hdf5(&sample(&dir, "b.h5", 2)).unwrap();

    match DiffEngine::new().diff_to_vec(&a, &b) {
        Err(H5CompareError::UnrecognizedKind { path, kind }) => {
            assert_eq!(path, "/dangling");
            assert_eq!(kind, "softlink");
        }
        other => panic!("unexpected: {other:?}"),
    }
}
