use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declared element type of a dataset or attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Byte (ASCII) strings
    Bytes,
    /// Unicode strings
    String,
    Compound,
    Enum,
    Array,
    Vlen,
    Opaque,
    Reference,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::Int8 => "int8",
            TypeTag::Int16 => "int16",
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::UInt8 => "uint8",
            TypeTag::UInt16 => "uint16",
            TypeTag::UInt32 => "uint32",
            TypeTag::UInt64 => "uint64",
            TypeTag::Float32 => "float32",
            TypeTag::Float64 => "float64",
            TypeTag::Bytes => "bytes",
            TypeTag::String => "string",
            TypeTag::Compound => "compound",
            TypeTag::Enum => "enum",
            TypeTag::Array => "array",
            TypeTag::Vlen => "vlen",
            TypeTag::Opaque => "opaque",
            TypeTag::Reference => "reference",
        }
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            TypeTag::Int8 | TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64
        )
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            TypeTag::UInt8 | TypeTag::UInt16 | TypeTag::UInt32 | TypeTag::UInt64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, TypeTag::Float32 | TypeTag::Float64)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TypeTag::Bytes | TypeTag::String)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Group,
    Dataset,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Group => f.write_str("group"),
            NodeKind::Dataset => f.write_str("dataset"),
        }
    }
}

/// Attribute name to declared type
pub type AttrMap = BTreeMap<String, TypeTag>;

/// A single materialized element of a dataset value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl Element {
    /// Value equality across numeric representations.
    ///
    /// Integers, floats and booleans compare by numeric value (`1 == 1.0`,
    /// `true == 1`). Strings only equal strings. NaN never equals anything,
    /// itself included.
    pub fn equals(&self, other: &Element) -> bool {
        use Element::*;
        match (self, other) {
            (Str(a), Str(b)) => a == b,
            (Str(_), _) | (_, Str(_)) => false,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Int(a), UInt(b)) | (UInt(b), Int(a)) => *a >= 0 && *a as u64 == *b,
            (Bool(a), Bool(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Element::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Element::Int(i) => Some(*i as f64),
            Element::UInt(u) => Some(*u as f64),
            Element::Float(f) => Some(*f),
            Element::Str(_) => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Element::Int(i) => write!(f, "{i}"),
            Element::UInt(u) => write!(f, "{u}"),
            Element::Float(x) => {
                if x.is_nan() {
                    f.write_str("nan")
                } else if x.is_infinite() {
                    f.write_str(if *x > 0.0 { "inf" } else { "-inf" })
                } else if x.fract() == 0.0 && x.abs() < 1e16 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Element::Str(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<bool> for Element {
    fn from(value: bool) -> Self {
        Element::Bool(value)
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        Element::Int(value as i64)
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        Element::Int(value)
    }
}

impl From<u64> for Element {
    fn from(value: u64) -> Self {
        Element::UInt(value)
    }
}

impl From<f32> for Element {
    fn from(value: f32) -> Self {
        Element::Float(value as f64)
    }
}

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        Element::Float(value)
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::Str(value.to_string())
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::Str(value)
    }
}

/// N-dimensional array stored in row-major order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray {
    shape: Vec<usize>,
    elements: Vec<Element>,
}

impl NdArray {
    /// Returns `None` when the element count does not match the shape.
    pub fn new(shape: Vec<usize>, elements: Vec<Element>) -> Option<Self> {
        if shape.iter().product::<usize>() != elements.len() {
            return None;
        }
        Some(Self { shape, elements })
    }

    pub fn from_vec<T: Into<Element>>(values: Vec<T>) -> Self {
        let elements: Vec<Element> = values.into_iter().map(Into::into).collect();
        Self {
            shape: vec![elements.len()],
            elements,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

}

/// Materialized dataset value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Scalar(Element),
    Array(NdArray),
}

impl Value {
    pub fn scalar(element: impl Into<Element>) -> Self {
        Value::Scalar(element.into())
    }

    pub fn array<T: Into<Element>>(values: Vec<T>) -> Self {
        Value::Array(NdArray::from_vec(values))
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Value::Scalar(_) => &[],
            Value::Array(array) => array.shape(),
        }
    }

    pub fn elements(&self) -> &[Element] {
        match self {
            Value::Scalar(element) => std::slice::from_ref(element),
            Value::Array(array) => array.elements(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.elements().len()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(element) => write!(f, "{element}"),
            Value::Array(array) if array.shape().is_empty() => match array.elements().first() {
                Some(element) => write!(f, "{element}"),
                None => f.write_str("[]"),
            },
            Value::Array(array) => {
                let mut offset = 0;
                write_nested(f, array.shape(), array.elements(), &mut offset)
            }
        }
    }
}

fn write_nested(
    f: &mut fmt::Formatter<'_>,
    shape: &[usize],
    elements: &[Element],
    offset: &mut usize,
) -> fmt::Result {
    f.write_str("[")?;
    match shape.split_first() {
        Some((&len, [])) => {
            for i in 0..len {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", elements[*offset])?;
                *offset += 1;
            }
        }
        Some((&len, rest)) => {
            for i in 0..len {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write_nested(f, rest, elements, offset)?;
            }
        }
        None => {}
    }
    f.write_str("]")
}

/// Comparison-ready summary of a single tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub kind: NodeKind,
    pub attrs: AttrMap,
    pub dtype: Option<TypeTag>,
}

impl Descriptor {
    pub fn group(attrs: AttrMap) -> Self {
        Self {
            kind: NodeKind::Group,
            attrs,
            dtype: None,
        }
    }

    pub fn dataset(dtype: TypeTag, attrs: AttrMap) -> Self {
        Self {
            kind: NodeKind::Dataset,
            attrs,
            dtype: Some(dtype),
        }
    }
}
