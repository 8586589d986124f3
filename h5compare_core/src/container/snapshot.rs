//! JSON snapshot files describing a container tree.
//!
//! A snapshot is a JSON object for the root group. Every node carries a
//! `kind` ("group", "dataset", or anything else for unsupported objects),
//! optional `attrs` mapping attribute names to declared types, and either
//! `children` (groups) or `dtype`/`data`/`shape` (datasets):
//!
//! ```json
//! {
//!   "attrs": { "title": "string" },
//!   "children": {
//!     "x": { "kind": "dataset", "dtype": "int32", "data": [1, 2, 3] },
//!     "grid": { "kind": "dataset", "dtype": "float64", "data": [[0.5, "nan"], [1, 2]] },
//!     "g": { "kind": "group", "children": {} },
//!     "alias": { "kind": "softlink" }
//!   }
//! }
//! ```

use super::memory::{MemoryDataset, MemoryGroup};
use h5compare_common::{AttrMap, Element, H5CompareError, NdArray, Result, TypeTag, Value};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotNode {
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    attrs: AttrMap,
    #[serde(default)]
    children: BTreeMap<String, SnapshotNode>,
    dtype: Option<TypeTag>,
    shape: Option<Vec<usize>>,
    data: Option<JsonValue>,
}

fn default_kind() -> String {
    "group".to_string()
}

/// Reads and parses a snapshot file
pub fn load_snapshot(path: &Path) -> Result<MemoryGroup> {
    let content = std::fs::read_to_string(path)?;
    parse_snapshot(&content)
}

/// Parses snapshot text into an in-memory tree
pub fn parse_snapshot(content: &str) -> Result<MemoryGroup> {
    let root: SnapshotNode = serde_json::from_str(content)
        .map_err(|e| H5CompareError::Snapshot(format!("Failed to parse snapshot: {}", e)))?;

    if root.kind != "group" {
        return Err(H5CompareError::Snapshot(format!(
            "Root must be a group, found '{}'",
            root.kind
        )));
    }
    build_group(root, "/")
}

fn build_group(node: SnapshotNode, path: &str) -> Result<MemoryGroup> {
    let mut group = MemoryGroup::named(path);
    for (name, tag) in node.attrs {
        group.insert_attr(name, tag);
    }

    for (name, child) in node.children {
        let child_path = format!("{path}{name}");
        match child.kind.as_str() {
            "group" => {
                let subgroup = build_group(child, &format!("{child_path}/"))?;
                group.insert_group(name, subgroup);
            }
            "dataset" => group.insert_dataset(name, build_dataset(child, &child_path)?),
            _ => group.insert_other(name, child.kind),
        }
    }
    Ok(group)
}

fn build_dataset(node: SnapshotNode, path: &str) -> Result<MemoryDataset> {
    if !node.children.is_empty() {
        return Err(invalid(path, "datasets cannot have children"));
    }
    let dtype = node.dtype.ok_or_else(|| invalid(path, "missing 'dtype'"))?;
    let data = node.data.ok_or_else(|| invalid(path, "missing 'data'"))?;

    let value = decode_value(&data, node.shape, dtype).map_err(|reason| invalid(path, &reason))?;
    let mut dataset = MemoryDataset::new(dtype, value);
    for (name, tag) in node.attrs {
        dataset = dataset.with_attr(name, tag);
    }
    Ok(dataset)
}

fn invalid(path: &str, reason: &str) -> H5CompareError {
    H5CompareError::Snapshot(format!("Invalid dataset '{}': {}", path, reason))
}

fn decode_value(
    data: &JsonValue,
    shape: Option<Vec<usize>>,
    dtype: TypeTag,
) -> std::result::Result<Value, String> {
    if !data.is_array() {
        return match shape.as_deref() {
            None | Some([]) => Ok(Value::Scalar(decode_element(data, dtype)?)),
            Some(shape) => Err(format!("scalar data cannot have shape {:?}", shape)),
        };
    }

    let nested_shape = infer_shape(data);
    let mut leaves = Vec::new();
    collect_leaves(data, &nested_shape, 0, &mut leaves)?;

    let elements = leaves
        .into_iter()
        .map(|leaf| decode_element(leaf, dtype))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let shape = shape.unwrap_or(nested_shape);
    let count = elements.len();
    if shape.is_empty() {
        // Zero-dimensional data is a scalar
        return match <[Element; 1]>::try_from(elements) {
            Ok([element]) => Ok(Value::Scalar(element)),
            Err(_) => Err(format!("{} elements do not fit shape []", count)),
        };
    }
    NdArray::new(shape.clone(), elements)
        .map(Value::Array)
        .ok_or_else(|| format!("{} elements do not fit shape {:?}", count, shape))
}

fn infer_shape(data: &JsonValue) -> Vec<usize> {
    let mut shape = Vec::new();
    let mut current = data;
    while let JsonValue::Array(items) = current {
        shape.push(items.len());
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    shape
}

fn collect_leaves<'a>(
    data: &'a JsonValue,
    shape: &[usize],
    depth: usize,
    out: &mut Vec<&'a JsonValue>,
) -> std::result::Result<(), String> {
    if depth == shape.len() {
        if data.is_array() {
            return Err("ragged nested arrays".to_string());
        }
        out.push(data);
        return Ok(());
    }

    match data {
        JsonValue::Array(items) if items.len() == shape[depth] => {
            for item in items {
                collect_leaves(item, shape, depth + 1, out)?;
            }
            Ok(())
        }
        _ => Err("ragged nested arrays".to_string()),
    }
}

fn decode_element(data: &JsonValue, dtype: TypeTag) -> std::result::Result<Element, String> {
    let element = match dtype {
        TypeTag::Bool => data.as_bool().map(Element::Bool),
        tag if tag.is_signed_integer() => data
            .as_i64()
            .filter(|&v| fits_signed(v, tag))
            .map(Element::Int),
        tag if tag.is_unsigned_integer() => data
            .as_u64()
            .filter(|&v| fits_unsigned(v, tag))
            .map(Element::UInt),
        tag if tag.is_float() => {
            let value = match data {
                JsonValue::String(s) => parse_special_float(s),
                other => other.as_f64(),
            };
            // Stored at the declared precision, then widened like a read from disk
            match tag {
                TypeTag::Float32 => value.map(|v| Element::Float(v as f32 as f64)),
                _ => value.map(Element::Float),
            }
        }
        tag if tag.is_string() => data.as_str().map(Element::from),
        other => return Err(format!("dtype '{}' is not supported in snapshots", other)),
    };
    element.ok_or_else(|| format!("{} is not a valid {} value", data, dtype))
}

fn fits_signed(value: i64, tag: TypeTag) -> bool {
    match tag {
        TypeTag::Int8 => i8::try_from(value).is_ok(),
        TypeTag::Int16 => i16::try_from(value).is_ok(),
        TypeTag::Int32 => i32::try_from(value).is_ok(),
        _ => true,
    }
}

fn fits_unsigned(value: u64, tag: TypeTag) -> bool {
    match tag {
        TypeTag::UInt8 => u8::try_from(value).is_ok(),
        TypeTag::UInt16 => u16::try_from(value).is_ok(),
        TypeTag::UInt32 => u32::try_from(value).is_ok(),
        _ => true,
    }
}

fn parse_special_float(s: &str) -> Option<f64> {
    match s.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Check if a file path appears to be a snapshot based on extension
pub fn is_snapshot_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        ext == "json"
    } else {
        false
    }
}
