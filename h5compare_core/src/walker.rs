//! Enumerates one level of a container tree into comparison-ready maps.

use h5compare_common::{
    ContainerGroup, ContainerObject, Descriptor, H5CompareError, Value,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What to do with a child that is neither a group nor a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnrecognizedPolicy {
    /// Fail the walk, aborting the whole comparison
    #[default]
    Abort,
    /// Record the child and leave it out of the listing
    Skip,
}

/// Materialized payload of a child
pub enum Entry {
    Group(Box<dyn ContainerGroup>),
    Dataset(Value),
}

impl Entry {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Dataset(value) => Some(value),
            Entry::Group(_) => None,
        }
    }
}

/// Summary of the direct children of one group
#[derive(Default)]
pub struct GroupListing {
    pub descriptors: BTreeMap<String, Descriptor>,
    pub entries: BTreeMap<String, Entry>,
    /// Skipped children as (name, runtime kind); only filled under `Skip`
    pub unrecognized: Vec<(String, String)>,
}

/// Classifies every direct child of `group`.
///
/// `path` is the display path of `group` and is only used in diagnostics.
pub fn walk(
    group: &dyn ContainerGroup,
    path: &str,
    policy: UnrecognizedPolicy,
) -> Result<GroupListing, H5CompareError> {
    let mut listing = GroupListing::default();

    for (name, object) in group.items()? {
        match object {
            ContainerObject::Dataset(dataset) => {
                let descriptor = Descriptor::dataset(dataset.dtype()?, dataset.attrs()?);
                let value = dataset.value()?;
                listing.descriptors.insert(name.clone(), descriptor);
                listing.entries.insert(name, Entry::Dataset(value));
            }
            ContainerObject::Group(child) => {
                listing
                    .descriptors
                    .insert(name.clone(), Descriptor::group(child.attrs()?));
                listing.entries.insert(name, Entry::Group(child));
            }
            ContainerObject::Other { kind } => match policy {
                UnrecognizedPolicy::Abort => {
                    return Err(H5CompareError::UnrecognizedKind {
                        path: format!("{path}{name}"),
                        kind,
                    });
                }
                UnrecognizedPolicy::Skip => {
                    warn!("Skipping {}{} of unrecognized kind '{}'", path, name, kind);
                    listing.unrecognized.push((name, kind));
                }
            },
        }
    }

    debug!(
        "Walked {}: {} elements, {} unrecognized",
        path,
        listing.descriptors.len(),
        listing.unrecognized.len()
    );
    Ok(listing)
}
