use crate::{AttrMap, Result, TypeTag, Value};
use std::sync::Arc;

/// Read-only view of a group inside a hierarchical container file
///
/// This trait allows H5Compare to treat HDF5 files, JSON snapshots and
/// in-memory trees uniformly. Implementations never mutate the source.
pub trait ContainerGroup {
    /// Name of the group inside its file (e.g. "/", "/results")
    fn name(&self) -> String;

    /// Attribute names mapped to their declared types
    fn attrs(&self) -> Result<AttrMap>;

    /// Direct children of this group, in any order
    fn items(&self) -> Result<Vec<(String, ContainerObject)>>;
}

/// Read-only view of a dataset inside a hierarchical container file
pub trait ContainerDataset {
    /// Attribute names mapped to their declared types
    fn attrs(&self) -> Result<AttrMap>;

    /// Declared element type
    fn dtype(&self) -> Result<TypeTag>;

    /// Reads the full value into memory
    fn value(&self) -> Result<Value>;
}

/// A child handle as reported by the container library
pub enum ContainerObject {
    Group(Box<dyn ContainerGroup>),
    Dataset(Box<dyn ContainerDataset>),
    /// Anything that is neither a group nor a dataset (links, named types)
    Other { kind: String },
}

impl ContainerObject {
    /// Runtime kind name, as used in diagnostics
    pub fn kind_name(&self) -> &str {
        match self {
            ContainerObject::Group(_) => "group",
            ContainerObject::Dataset(_) => "dataset",
            ContainerObject::Other { kind } => kind,
        }
    }
}

impl std::fmt::Debug for ContainerObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContainerObject({})", self.kind_name())
    }
}

impl<T: ContainerGroup + ?Sized> ContainerGroup for Arc<T> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn attrs(&self) -> Result<AttrMap> {
        (**self).attrs()
    }

    fn items(&self) -> Result<Vec<(String, ContainerObject)>> {
        (**self).items()
    }
}

impl<T: ContainerDataset + ?Sized> ContainerDataset for Arc<T> {
    fn attrs(&self) -> Result<AttrMap> {
        (**self).attrs()
    }

    fn dtype(&self) -> Result<TypeTag> {
        (**self).dtype()
    }

    fn value(&self) -> Result<Value> {
        (**self).value()
    }
}
