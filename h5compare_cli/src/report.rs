//! Rendering of the diff record stream.

use h5compare_common::{DiffKind, DiffRecord, DiffSink, DiffSummary, Element, Side, ValueMismatch};
use serde::Serialize;
use std::io::{self, Write};

const RULE: &str = "------------------------------";

/// Streams records as human-readable text
pub struct TextReporter<W: Write> {
    out: W,
    file_a: String,
    file_b: String,
    diff_only: bool,
    use_color: bool,
    current_path: Option<String>,
    summary: DiffSummary,
    error: Option<io::Error>,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W, file_a: impl Into<String>, file_b: impl Into<String>) -> Self {
        Self {
            out,
            file_a: file_a.into(),
            file_b: file_b.into(),
            diff_only: false,
            use_color: false,
            current_path: None,
            summary: DiffSummary::default(),
            error: None,
        }
    }

    pub fn with_diff_only(mut self, diff_only: bool) -> Self {
        self.diff_only = diff_only;
        self
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    pub fn header(&mut self) {
        let line = format!("Comparing '{}' and '{}'", self.file_a, self.file_b);
        self.line(&line);
    }

    /// Writes the closing summary and surfaces any deferred write error
    pub fn finish(mut self) -> io::Result<DiffSummary> {
        let s = self.summary;
        let rule = "=".repeat(80);
        let lines = [
            String::new(),
            rule.clone(),
            "Summary:".to_string(),
            format!("  Only in '{}':{:>8}", self.file_a, s.unique_a),
            format!("  Only in '{}':{:>8}", self.file_b, s.unique_b),
            format!("  Element type mismatches: {}", s.kind_mismatches),
            format!("  Dtype mismatches:        {}", s.dtype_mismatches),
            format!(
                "  Attribute mismatches:    {}",
                s.attr_unique_a + s.attr_unique_b + s.attr_type_mismatches
            ),
            format!("  Value mismatches:        {}", s.value_mismatches),
            format!("  Identical values:        {}", s.values_equal),
            format!("  Unrecognized elements:   {}", s.unrecognized),
            format!("  Total differences:       {}", s.differences()),
            rule,
        ];
        for line in &lines {
            self.line(line);
        }

        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(s)
    }

    fn line(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{}", text) {
            self.error = Some(err);
        }
    }

    fn colored(&self, color: &str, text: String) -> String {
        if self.use_color {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text
        }
    }

    fn file_label(&self, side: Side) -> &str {
        match side {
            Side::A => &self.file_a,
            Side::B => &self.file_b,
        }
    }

    fn render(&self, record: &DiffRecord) -> Vec<String> {
        let name = &record.name;
        match &record.kind {
            DiffKind::ValueEqual => vec![self.colored(
                "\x1b[32m",
                format!("** Values of '{}' are the same in both files **", name),
            )],
            DiffKind::ValueMismatch(mismatch) => {
                let mut lines = vec![self.colored(
                    "\x1b[31m",
                    format!("** Values of '{}' differ! **", name),
                )];
                match mismatch {
                    ValueMismatch::Elementwise {
                        mismatch_count,
                        total_count,
                        indices,
                        values_a,
                        values_b,
                    } => {
                        lines.push(format!(
                            "{} non-matching values out of {} values.",
                            mismatch_count, total_count
                        ));
                        lines.push(format!(
                            "Non-matching values at indices: {}",
                            format_indices(indices)
                        ));
                        lines.push(format!("Values in file1: {}", format_elements(values_a)));
                        lines.push(format!("Values in file2: {}", format_elements(values_b)));
                    }
                    ValueMismatch::Whole { value_a, value_b } => {
                        lines.push(format!("Value {} differs from {}", value_a, value_b));
                    }
                }
                lines
            }
            DiffKind::UniqueToA => vec![self.colored(
                "\x1b[33m",
                format!(
                    "** Element '{}' only in '{}' (DIFF_UNIQUE_A)**",
                    name, self.file_a
                ),
            )],
            DiffKind::UniqueToB => vec![self.colored(
                "\x1b[34m",
                format!(
                    "** Element '{}' only in '{}' (DIFF_UNIQUE_B)**",
                    name, self.file_b
                ),
            )],
            DiffKind::KindMismatch { kind_a, kind_b } => vec![self.colored(
                "\x1b[31m",
                format!(
                    "** Element '{}': different element types: '{}' and '{}' (DIFF_OBJECTS)**",
                    name, kind_a, kind_b
                ),
            )],
            DiffKind::DtypeMismatch { dtype_a, dtype_b } => vec![self.colored(
                "\x1b[31m",
                format!(
                    "** Element '{}': different dtypes: '{}' and '{}' (DIFF_DTYPE)**",
                    name, dtype_a, dtype_b
                ),
            )],
            DiffKind::AttrUniqueToA { attr } => vec![self.colored(
                "\x1b[33m",
                format!(
                    "** Attribute '{}' of '{}' only in '{}' (DIFF_UNIQ_ATTR_A)**",
                    attr, name, self.file_a
                ),
            )],
            DiffKind::AttrUniqueToB { attr } => vec![self.colored(
                "\x1b[34m",
                format!(
                    "** Attribute '{}' of '{}' only in '{}' (DIFF_UNIQ_ATTR_B)**",
                    attr, name, self.file_b
                ),
            )],
            DiffKind::AttrTypeMismatch {
                attr,
                type_a,
                type_b,
            } => vec![self.colored(
                "\x1b[31m",
                format!(
                    "** Attribute '{}' of '{}' has different type: '{}' and '{}' (DIFF_ATTR_DTYPE)**",
                    attr, name, type_a, type_b
                ),
            )],
            DiffKind::UnrecognizedKind { side, kind } => vec![self.colored(
                "\x1b[36m",
                format!(
                    "WARNING: element '{}' in '{}' is not a recognized type ({}) and isn't being evaluated",
                    name,
                    self.file_label(*side),
                    kind
                ),
            )],
        }
    }
}

impl<W: Write> TextReporter<W> {
    fn examining(&mut self, path: &str) {
        self.line(RULE);
        let header = format!("Examining {}", path);
        self.line(&header);
        self.current_path = Some(path.to_string());
    }
}

impl<W: Write> DiffSink for TextReporter<W> {
    fn begin_group(&mut self, path: &str) {
        self.examining(path);
    }

    fn emit(&mut self, record: DiffRecord) {
        self.summary.add(&record.kind);
        if self.diff_only && record.kind == DiffKind::ValueEqual {
            return;
        }

        // Subgroup attribute records belong to the parent path
        if self.current_path.as_deref() != Some(record.path.as_str()) {
            self.examining(&record.path);
        }

        for line in self.render(&record) {
            self.line(&line);
        }
    }
}

fn format_indices(indices: &[Vec<usize>]) -> String {
    let parts: Vec<String> = indices
        .iter()
        .map(|index| match index.as_slice() {
            [single] => single.to_string(),
            many => format!(
                "({})",
                many.iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}

fn format_elements(elements: &[Element]) -> String {
    let parts: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
    format!("[{}]", parts.join(" "))
}

#[derive(Serialize)]
pub struct JsonReport {
    pub file1: String,
    pub file2: String,
    pub summary: DiffSummary,
    pub identical: bool,
    pub records: Vec<DiffRecord>,
}

pub fn build_json_report(
    file1: &str,
    file2: &str,
    records: Vec<DiffRecord>,
    diff_only: bool,
) -> JsonReport {
    let summary = DiffSummary::from_records(&records);
    let records = records
        .into_iter()
        .filter(|record| !(diff_only && record.kind == DiffKind::ValueEqual))
        .collect();

    JsonReport {
        file1: file1.to_string(),
        file2: file2.to_string(),
        identical: !summary.has_differences(),
        summary,
        records,
    }
}
