use super::snapshot::parse_snapshot;
use h5compare_common::{
    ContainerGroup, ContainerObject, Element, H5CompareError, NdArray, TypeTag, Value,
};

fn child(group: &dyn ContainerGroup, name: &str) -> ContainerObject {
    group
        .items()
        .unwrap()
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, object)| object)
        .unwrap_or_else(|| panic!("no child named {name}"))
}

fn dataset_value(group: &dyn ContainerGroup, name: &str) -> (TypeTag, Value) {
    match child(group, name) {
        ContainerObject::Dataset(dataset) => (dataset.dtype().unwrap(), dataset.value().unwrap()),
        other => panic!("{name} is not a dataset: {other:?}"),
    }
}

#[test]
fn test_root_defaults_to_group() {
    let root = parse_snapshot(r#"{"attrs": {"title": "string", "version": "int32"}}"#).unwrap();
    let attrs = root.attrs().unwrap();
    assert_eq!(attrs.get("title"), Some(&TypeTag::String));
    assert_eq!(attrs.get("version"), Some(&TypeTag::Int32));
    assert!(root.items().unwrap().is_empty());
}

#[test]
fn test_flat_dataset() {
    let root = parse_snapshot(
        r#"{"children": {"x": {"kind": "dataset", "dtype": "int32", "data": [1, 2, 3]}}}"#,
    )
    .unwrap();

    let (dtype, value) = dataset_value(&root, "x");
    assert_eq!(dtype, TypeTag::Int32);
    assert_eq!(value, Value::array(vec![1i64, 2, 3]));
}

#[test]
fn test_nested_data_infers_shape() {
    let root = parse_snapshot(
        r#"{"children": {"grid": {"kind": "dataset", "dtype": "float64",
            "data": [[0.5, "nan"], [1, "-inf"]]}}}"#,
    )
    .unwrap();

    let (_, value) = dataset_value(&root, "grid");
    assert_eq!(value.shape(), &[2, 2]);
    let elements = value.elements();
    assert_eq!(elements[0], Element::Float(0.5));
    assert!(matches!(elements[1], Element::Float(x) if x.is_nan()));
    assert_eq!(elements[2], Element::Float(1.0));
    assert_eq!(elements[3], Element::Float(f64::NEG_INFINITY));
}

#[test]
fn test_explicit_shape_reshapes_flat_data() {
    let root = parse_snapshot(
        r#"{"children": {"m": {"kind": "dataset", "dtype": "uint8",
            "shape": [2, 3], "data": [1, 2, 3, 4, 5, 6]}}}"#,
    )
    .unwrap();

    let (_, value) = dataset_value(&root, "m");
    let expected = NdArray::new(vec![2, 3], (1..=6u64).map(Element::UInt).collect()).unwrap();
    assert_eq!(value, Value::Array(expected));
}

#[test]
fn test_scalar_dataset() {
    let root = parse_snapshot(
        r#"{"children": {"s": {"kind": "dataset", "dtype": "string", "data": "hello"}}}"#,
    )
    .unwrap();

    let (dtype, value) = dataset_value(&root, "s");
    assert_eq!(dtype, TypeTag::String);
    assert_eq!(value, Value::scalar("hello"));
}

#[test]
fn test_nested_groups_and_attrs() {
    let root = parse_snapshot(
        r#"{"children": {"g": {"kind": "group", "attrs": {"created": "int64"},
            "children": {"a": {"kind": "dataset", "dtype": "bool", "data": [true, false],
                "attrs": {"units": "bytes"}}}}}}"#,
    )
    .unwrap();

    let g = match child(&root, "g") {
        ContainerObject::Group(g) => g,
        other => panic!("unexpected: {other:?}"),
    };
    assert_eq!(g.name(), "/g/");
    assert_eq!(g.attrs().unwrap().get("created"), Some(&TypeTag::Int64));

    match child(g.as_ref(), "a") {
        ContainerObject::Dataset(a) => {
            assert_eq!(a.attrs().unwrap().get("units"), Some(&TypeTag::Bytes));
            assert_eq!(a.value().unwrap(), Value::array(vec![true, false]));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_unknown_kind_becomes_other() {
    let root = parse_snapshot(r#"{"children": {"alias": {"kind": "softlink"}}}"#).unwrap();
    match child(&root, "alias") {
        ContainerObject::Other { kind } => assert_eq!(kind, "softlink"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_ragged_data_is_rejected() {
    let err = parse_snapshot(
        r#"{"children": {"r": {"kind": "dataset", "dtype": "int32", "data": [[1, 2], [3]]}}}"#,
    )
    .err()
    .unwrap();
    assert!(matches!(err, H5CompareError::Snapshot(ref msg) if msg.contains("/r")));
}

#[test]
fn test_wrong_element_type_is_rejected() {
    let result = parse_snapshot(
        r#"{"children": {"x": {"kind": "dataset", "dtype": "int32", "data": [1, "two"]}}}"#,
    );
    assert!(matches!(result, Err(H5CompareError::Snapshot(_))));
}

#[test]
fn test_shape_mismatch_is_rejected() {
    let result = parse_snapshot(
        r#"{"children": {"x": {"kind": "dataset", "dtype": "int32", "shape": [2, 2], "data": [1, 2, 3]}}}"#,
    );
    assert!(matches!(result, Err(H5CompareError::Snapshot(_))));
}

#[test]
fn test_missing_dtype_is_rejected() {
    let result = parse_snapshot(r#"{"children": {"x": {"kind": "dataset", "data": [1]}}}"#);
    assert!(matches!(result, Err(H5CompareError::Snapshot(_))));
}

#[test]
fn test_root_must_be_group() {
    let result = parse_snapshot(r#"{"kind": "dataset", "dtype": "int8", "data": 1}"#);
    assert!(matches!(result, Err(H5CompareError::Snapshot(_))));
}

#[test]
fn test_integers_must_fit_declared_width() {
    for (dtype, data) in [
        ("int8", "[1000]"),
        ("int16", "[-40000]"),
        ("int32", "[3000000000]"),
        ("uint8", "[256]"),
        ("uint32", "[4294967296]"),
        ("uint16", "[-1]"),
    ] {
        let text = format!(
            r#"{{"children": {{"x": {{"kind": "dataset", "dtype": "{dtype}", "data": {data}}}}}}}"#
        );
        assert!(
            matches!(parse_snapshot(&text), Err(H5CompareError::Snapshot(_))),
            "{dtype} accepted {data}"
        );
    }

    let root = parse_snapshot(
        r#"{"children": {
            "lo": {"kind": "dataset", "dtype": "int8", "data": [-128, 127]},
            "hi": {"kind": "dataset", "dtype": "uint8", "data": [0, 255]}
        }}"#,
    )
    .unwrap();
    assert_eq!(dataset_value(&root, "lo").1, Value::array(vec![-128i64, 127]));
    assert_eq!(dataset_value(&root, "hi").1, Value::array(vec![0u64, 255]));
}

#[test]
fn test_float32_data_is_stored_at_single_precision() {
    let root = parse_snapshot(
        r#"{"children": {
            "single": {"kind": "dataset", "dtype": "float32", "data": [0.1, "nan"]},
            "double": {"kind": "dataset", "dtype": "float64", "data": [0.1]}
        }}"#,
    )
    .unwrap();

    let (_, single) = dataset_value(&root, "single");
    assert_eq!(single.elements()[0], Element::Float(0.1f32 as f64));
    assert!(matches!(single.elements()[1], Element::Float(x) if x.is_nan()));

    let (_, double) = dataset_value(&root, "double");
    assert_eq!(double.elements()[0], Element::Float(0.1));
    assert!(!single.elements()[0].equals(&double.elements()[0]));
}

#[test]
fn test_zero_dimensional_data_is_scalar() {
    let root = parse_snapshot(
        r#"{"children": {"x": {"kind": "dataset", "dtype": "int32", "shape": [], "data": [7]}}}"#,
    )
    .unwrap();

    let (_, value) = dataset_value(&root, "x");
    assert_eq!(value, Value::scalar(7i64));
    assert_eq!(value.to_string(), "7");
}
