use crate::value_diff::{compare_values, ValueOutcome};
use crate::walker::{walk, Entry, GroupListing, UnrecognizedPolicy};
use h5compare_common::{
    AttrMap, AppConfig, ContainerGroup, DiffKind, DiffRecord, DiffSink, H5CompareError, NodeKind, Side,
};
use tracing::{debug, info};

/// Options controlling how two trees are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Handling of children that are neither groups nor datasets
    pub unrecognized: UnrecognizedPolicy,
    /// Compare declared attribute types on groups, not only attribute names
    pub group_attr_types: bool,
}

impl From<&AppConfig> for DiffOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            unrecognized: if config.keep_going {
                UnrecognizedPolicy::Skip
            } else {
                UnrecognizedPolicy::Abort
            },
            group_attr_types: config.group_attr_types,
        }
    }
}

/// A common subgroup waiting for its attribute check and descent
struct PendingGroup {
    parent_path: String,
    name: String,
    attrs_a: AttrMap,
    attrs_b: AttrMap,
    a: Box<dyn ContainerGroup>,
    b: Box<dyn ContainerGroup>,
}

/// Diff engine for comparing two container trees
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_unrecognized_policy(mut self, policy: UnrecognizedPolicy) -> Self {
        self.options.unrecognized = policy;
        self
    }

    pub fn with_group_attr_types(mut self, enabled: bool) -> Self {
        self.options.group_attr_types = enabled;
        self
    }

    /// Compare two trees and collect every record
    pub fn diff_to_vec(
        &self,
        a: &dyn ContainerGroup,
        b: &dyn ContainerGroup,
    ) -> Result<Vec<DiffRecord>, H5CompareError> {
        let mut records = Vec::new();
        self.diff(a, b, &mut records)?;
        Ok(records)
    }

    /// Compare two trees rooted at `a` and `b`, streaming records into `sink`.
    ///
    /// Records arrive in depth-first order: all findings for a group come
    /// before those of its subgroups, and a subgroup's subtree is complete
    /// before its next sibling subgroup starts. Subtrees are tracked on an
    /// explicit stack so tree depth is not limited by the call stack.
    pub fn diff(
        &self,
        a: &dyn ContainerGroup,
        b: &dyn ContainerGroup,
        sink: &mut dyn DiffSink,
    ) -> Result<(), H5CompareError> {
        info!("Comparing '{}' with '{}'", a.name(), b.name());

        let mut stack = self.diff_level("/", a, b, sink)?;
        stack.reverse();
        let mut groups = 1usize;

        while let Some(pending) = stack.pop() {
            self.compare_attrs(
                &pending.parent_path,
                &pending.name,
                &pending.attrs_a,
                &pending.attrs_b,
                self.options.group_attr_types,
                sink,
            );

            let path = format!("{}{}/", pending.parent_path, pending.name);
            let mut children = self.diff_level(&path, pending.a.as_ref(), pending.b.as_ref(), sink)?;
            children.reverse();
            stack.extend(children);
            groups += 1;
        }

        info!("Compared {} groups", groups);
        Ok(())
    }

    /// Compares the direct children of one pair of groups and returns the
    /// common subgroups to descend into, in name order.
    fn diff_level(
        &self,
        path: &str,
        a: &dyn ContainerGroup,
        b: &dyn ContainerGroup,
        sink: &mut dyn DiffSink,
    ) -> Result<Vec<PendingGroup>, H5CompareError> {
        debug!("Examining {}", path);
        sink.begin_group(path);

        let mut listing_a = walk(a, path, self.options.unrecognized)?;
        let mut listing_b = walk(b, path, self.options.unrecognized)?;
        report_unrecognized(path, Side::A, &listing_a, sink);
        report_unrecognized(path, Side::B, &listing_b, sink);

        // Values first, for every name on side A that also exists on side B
        for (name, entry) in &listing_a.entries {
            let (Some(value_a), Some(value_b)) = (
                entry.as_value(),
                listing_b.entries.get(name).and_then(Entry::as_value),
            ) else {
                continue;
            };

            let kind = match compare_values(value_a, value_b) {
                ValueOutcome::Equal => DiffKind::ValueEqual,
                ValueOutcome::Mismatch(mismatch) => DiffKind::ValueMismatch(mismatch),
            };
            sink.emit(DiffRecord::new(path, name.as_str(), kind));
        }

        // Existence
        let mut common = Vec::new();
        for name in listing_a.descriptors.keys() {
            if listing_b.descriptors.contains_key(name) {
                common.push(name.clone());
            } else {
                sink.emit(DiffRecord::new(path, name.as_str(), DiffKind::UniqueToA));
            }
        }
        for name in listing_b.descriptors.keys() {
            if !listing_a.descriptors.contains_key(name) {
                sink.emit(DiffRecord::new(path, name.as_str(), DiffKind::UniqueToB));
            }
        }

        // Pass 1: kinds, then dtype and attributes of datasets
        for name in &common {
            let desc_a = &listing_a.descriptors[name];
            let desc_b = &listing_b.descriptors[name];

            if desc_a.kind != desc_b.kind {
                sink.emit(DiffRecord::new(
                    path,
                    name.as_str(),
                    DiffKind::KindMismatch {
                        kind_a: desc_a.kind,
                        kind_b: desc_b.kind,
                    },
                ));
                continue;
            }

            match desc_a.kind {
                NodeKind::Group => {}
                NodeKind::Dataset => {
                    if let (Some(dtype_a), Some(dtype_b)) = (desc_a.dtype, desc_b.dtype) {
                        if dtype_a != dtype_b {
                            sink.emit(DiffRecord::new(
                                path,
                                name.as_str(),
                                DiffKind::DtypeMismatch { dtype_a, dtype_b },
                            ));
                        }
                    }
                    self.compare_attrs(path, name, &desc_a.attrs, &desc_b.attrs, true, sink);
                }
            }
        }

        // Pass 2: subgroups present as groups on both sides
        let mut pending = Vec::new();
        for name in common {
            let both_groups = listing_a.descriptors[&name].kind == NodeKind::Group
                && listing_b.descriptors[&name].kind == NodeKind::Group;
            if !both_groups {
                continue;
            }

            let (Some(Entry::Group(group_a)), Some(Entry::Group(group_b))) = (
                listing_a.entries.remove(&name),
                listing_b.entries.remove(&name),
            ) else {
                continue;
            };

            let attrs_a = listing_a
                .descriptors
                .get_mut(&name)
                .map(|d| std::mem::take(&mut d.attrs))
                .unwrap_or_default();
            let attrs_b = listing_b
                .descriptors
                .get_mut(&name)
                .map(|d| std::mem::take(&mut d.attrs))
                .unwrap_or_default();

            pending.push(PendingGroup {
                parent_path: path.to_string(),
                name,
                attrs_a,
                attrs_b,
                a: group_a,
                b: group_b,
            });
        }

        Ok(pending)
    }

    fn compare_attrs(
        &self,
        path: &str,
        name: &str,
        attrs_a: &AttrMap,
        attrs_b: &AttrMap,
        compare_types: bool,
        sink: &mut dyn DiffSink,
    ) {
        for attr in attrs_a.keys() {
            if !attrs_b.contains_key(attr) {
                sink.emit(DiffRecord::new(
                    path,
                    name,
                    DiffKind::AttrUniqueToA { attr: attr.clone() },
                ));
            }
        }
        for attr in attrs_b.keys() {
            if !attrs_a.contains_key(attr) {
                sink.emit(DiffRecord::new(
                    path,
                    name,
                    DiffKind::AttrUniqueToB { attr: attr.clone() },
                ));
            }
        }

        if !compare_types {
            return;
        }
        for (attr, type_a) in attrs_a {
            if let Some(type_b) = attrs_b.get(attr) {
                if type_a != type_b {
                    sink.emit(DiffRecord::new(
                        path,
                        name,
                        DiffKind::AttrTypeMismatch {
                            attr: attr.clone(),
                            type_a: *type_a,
                            type_b: *type_b,
                        },
                    ));
                }
            }
        }
    }
}

fn report_unrecognized(path: &str, side: Side, listing: &GroupListing, sink: &mut dyn DiffSink) {
    for (name, kind) in &listing.unrecognized {
        sink.emit(DiffRecord::new(
            path,
            name.as_str(),
            DiffKind::UnrecognizedKind {
                side,
                kind: kind.clone(),
            },
        ));
    }
}
