use crate::{Element, NodeKind, TypeTag, Value};
use serde::Serialize;

/// Which of the two compared files a finding refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

/// Detail of a value difference between two datasets
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ValueMismatch {
    /// Same-shape arrays compared position by position
    Elementwise {
        mismatch_count: usize,
        total_count: usize,
        /// Multi-dimensional index of every mismatch, row-major order
        indices: Vec<Vec<usize>>,
        values_a: Vec<Element>,
        values_b: Vec<Element>,
    },
    /// Values that cannot be masked element-wise, compared as a whole
    Whole { value_a: Value, value_b: Value },
}

/// Category of a single finding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiffKind {
    /// Element only exists in file A
    UniqueToA,
    /// Element only exists in file B
    UniqueToB,
    KindMismatch { kind_a: NodeKind, kind_b: NodeKind },
    DtypeMismatch { dtype_a: TypeTag, dtype_b: TypeTag },
    AttrUniqueToA { attr: String },
    AttrUniqueToB { attr: String },
    AttrTypeMismatch {
        attr: String,
        type_a: TypeTag,
        type_b: TypeTag,
    },
    ValueMismatch(ValueMismatch),
    ValueEqual,
    /// Child that is neither group nor dataset, skipped
    UnrecognizedKind { side: Side, kind: String },
}

impl DiffKind {
    /// Whether this finding counts as a difference between the files
    pub fn is_difference(&self) -> bool {
        !matches!(self, DiffKind::ValueEqual | DiffKind::UnrecognizedKind { .. })
    }
}

/// One finding produced while comparing two trees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRecord {
    /// Display path of the group being examined, always ending in '/'
    pub path: String,
    /// Child name the finding is about
    pub name: String,
    #[serde(flatten)]
    pub kind: DiffKind,
}

impl DiffRecord {
    pub fn new(path: impl Into<String>, name: impl Into<String>, kind: DiffKind) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind,
        }
    }

    /// Full path of the element, e.g. "/g/x"
    pub fn element_path(&self) -> String {
        format!("{}{}", self.path, self.name)
    }
}

/// Consumer of the ordered record stream
pub trait DiffSink {
    /// Called once per visited group, before any of its records
    fn begin_group(&mut self, _path: &str) {}

    fn emit(&mut self, record: DiffRecord);
}

impl DiffSink for Vec<DiffRecord> {
    fn emit(&mut self, record: DiffRecord) {
        self.push(record);
    }
}

/// Per-category tally of a record stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub unique_a: usize,
    pub unique_b: usize,
    pub kind_mismatches: usize,
    pub dtype_mismatches: usize,
    pub attr_unique_a: usize,
    pub attr_unique_b: usize,
    pub attr_type_mismatches: usize,
    pub value_mismatches: usize,
    pub values_equal: usize,
    pub unrecognized: usize,
}

impl DiffSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DiffRecord>) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.add(&record.kind);
        }
        summary
    }

    pub fn add(&mut self, kind: &DiffKind) {
        match kind {
            DiffKind::UniqueToA => self.unique_a += 1,
            DiffKind::UniqueToB => self.unique_b += 1,
            DiffKind::KindMismatch { .. } => self.kind_mismatches += 1,
            DiffKind::DtypeMismatch { .. } => self.dtype_mismatches += 1,
            DiffKind::AttrUniqueToA { .. } => self.attr_unique_a += 1,
            DiffKind::AttrUniqueToB { .. } => self.attr_unique_b += 1,
            DiffKind::AttrTypeMismatch { .. } => self.attr_type_mismatches += 1,
            DiffKind::ValueMismatch(_) => self.value_mismatches += 1,
            DiffKind::ValueEqual => self.values_equal += 1,
            DiffKind::UnrecognizedKind { .. } => self.unrecognized += 1,
        }
    }

    pub fn differences(&self) -> usize {
        self.unique_a
            + self.unique_b
            + self.kind_mismatches
            + self.dtype_mismatches
            + self.attr_unique_a
            + self.attr_unique_b
            + self.attr_type_mismatches
            + self.value_mismatches
    }

    pub fn has_differences(&self) -> bool {
        self.differences() > 0
    }
}
