//! Native HDF5 files through the `hdf5` crate.

use h5compare_common::{
    AttrMap, ContainerDataset, ContainerGroup, ContainerObject, Element, H5CompareError,
    NdArray, Result, TypeTag, Value,
};
use hdf5::types::{FloatSize, IntSize, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, File, Group, LinkType, Location};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn container_err(context: &str, err: hdf5::Error) -> H5CompareError {
    H5CompareError::Container(format!("{}: {}", context, err))
}

/// Opens an HDF5 file read-only and returns its root group
pub fn open_hdf5(path: &Path) -> Result<Hdf5Group> {
    let file = File::open(path).map_err(|e| H5CompareError::file_open(path.display().to_string(), e))?;
    let root = file
        .group("/")
        .map_err(|e| H5CompareError::file_open(path.display().to_string(), e))?;
    debug!("Opened HDF5 file {}", path.display());

    Ok(Hdf5Group {
        group: root,
        _file: Some(Arc::new(file)),
    })
}

/// A group inside an open HDF5 file
pub struct Hdf5Group {
    group: Group,
    // Keeps the file handle alive for the root group
    _file: Option<Arc<File>>,
}

impl ContainerGroup for Hdf5Group {
    fn name(&self) -> String {
        self.group.name()
    }

    fn attrs(&self) -> Result<AttrMap> {
        read_attr_types(&self.group)
    }

    fn items(&self) -> Result<Vec<(String, ContainerObject)>> {
        let names = self
            .group
            .member_names()
            .map_err(|e| container_err(&self.group.name(), e))?;

        let mut links: Option<HashMap<String, &'static str>> = None;
        let mut items = Vec::with_capacity(names.len());
        for name in names {
            let object = if let Ok(group) = self.group.group(&name) {
                ContainerObject::Group(Box::new(Hdf5Group {
                    group,
                    _file: self._file.clone(),
                }))
            } else if let Ok(dataset) = self.group.dataset(&name) {
                ContainerObject::Dataset(Box::new(Hdf5Dataset { dataset }))
            } else {
                let kind = links
                    .get_or_insert_with(|| link_kinds(&self.group))
                    .get(&name)
                    .copied()
                    .unwrap_or("unknown");
                ContainerObject::Other {
                    kind: kind.to_string(),
                }
            };
            items.push((name, object));
        }
        Ok(items)
    }
}

/// Link kind of every direct member, for members that resolve to neither a
/// group nor a dataset
fn link_kinds(group: &Group) -> HashMap<String, &'static str> {
    group
        .iter_visit_default(HashMap::new(), |_, name, info, kinds| {
            kinds.insert(name.to_string(), link_kind_name(&info.link_type));
            true
        })
        .unwrap_or_else(|e| {
            debug!("Unable to list links of {}: {}", group.name(), e);
            HashMap::new()
        })
}

fn link_kind_name(link_type: &LinkType) -> &'static str {
    match link_type {
        LinkType::Soft => "softlink",
        LinkType::External => "externallink",
        // A hard link that is not a group or dataset is a committed datatype
        _ => "datatype",
    }
}

/// A dataset inside an open HDF5 file
pub struct Hdf5Dataset {
    dataset: Dataset,
}

impl Hdf5Dataset {
    fn descriptor(&self) -> Result<TypeDescriptor> {
        self.dataset
            .dtype()
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(|e| container_err(&self.dataset.name(), e))
    }
}

impl ContainerDataset for Hdf5Dataset {
    fn attrs(&self) -> Result<AttrMap> {
        read_attr_types(&self.dataset)
    }

    fn dtype(&self) -> Result<TypeTag> {
        Ok(type_tag(&self.descriptor()?))
    }

    fn value(&self) -> Result<Value> {
        let name = self.dataset.name();
        let elements = read_elements(&self.dataset, &self.descriptor()?)
            .map_err(|e| container_err(&name, e))?;

        let shape = self.dataset.shape();
        if shape.is_empty() {
            return elements
                .into_iter()
                .next()
                .map(Value::Scalar)
                .ok_or_else(|| H5CompareError::Container(format!("{}: empty scalar", name)));
        }

        NdArray::new(shape, elements)
            .map(Value::Array)
            .ok_or_else(|| H5CompareError::Container(format!("{}: shape mismatch", name)))
    }
}

fn read_elements(dataset: &Dataset, descriptor: &TypeDescriptor) -> hdf5::Result<Vec<Element>> {
    let elements = match descriptor {
        TypeDescriptor::Boolean => dataset
            .read_raw::<bool>()?
            .into_iter()
            .map(Element::Bool)
            .collect(),
        TypeDescriptor::Integer(_) => dataset
            .read_raw::<i64>()?
            .into_iter()
            .map(Element::Int)
            .collect(),
        TypeDescriptor::Unsigned(_) => dataset
            .read_raw::<u64>()?
            .into_iter()
            .map(Element::UInt)
            .collect(),
        TypeDescriptor::Float(_) => dataset
            .read_raw::<f64>()?
            .into_iter()
            .map(Element::Float)
            .collect(),
        TypeDescriptor::VarLenAscii | TypeDescriptor::FixedAscii(_) => dataset
            .read_raw::<VarLenAscii>()?
            .into_iter()
            .map(|s| Element::Str(s.as_str().to_string()))
            .collect(),
        TypeDescriptor::VarLenUnicode | TypeDescriptor::FixedUnicode(_) => dataset
            .read_raw::<VarLenUnicode>()?
            .into_iter()
            .map(|s| Element::Str(s.as_str().to_string()))
            .collect(),
        other => {
            return Err(hdf5::Error::from(format!(
                "unsupported element type {:?}",
                other
            )))
        }
    };
    Ok(elements)
}

fn read_attr_types(location: &Location) -> Result<AttrMap> {
    let mut attrs = AttrMap::new();
    let names = location
        .attr_names()
        .map_err(|e| container_err(&location.name(), e))?;

    for name in names {
        let descriptor = location
            .attr(&name)
            .and_then(|attr| attr.dtype())
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(|e| container_err(&format!("{}@{}", location.name(), name), e))?;
        attrs.insert(name, type_tag(&descriptor));
    }
    Ok(attrs)
}

fn type_tag(descriptor: &TypeDescriptor) -> TypeTag {
    match descriptor {
        TypeDescriptor::Boolean => TypeTag::Bool,
        TypeDescriptor::Integer(IntSize::U1) => TypeTag::Int8,
        TypeDescriptor::Integer(IntSize::U2) => TypeTag::Int16,
        TypeDescriptor::Integer(IntSize::U4) => TypeTag::Int32,
        TypeDescriptor::Integer(IntSize::U8) => TypeTag::Int64,
        TypeDescriptor::Unsigned(IntSize::U1) => TypeTag::UInt8,
        TypeDescriptor::Unsigned(IntSize::U2) => TypeTag::UInt16,
        TypeDescriptor::Unsigned(IntSize::U4) => TypeTag::UInt32,
        TypeDescriptor::Unsigned(IntSize::U8) => TypeTag::UInt64,
        TypeDescriptor::Float(FloatSize::U4) => TypeTag::Float32,
        TypeDescriptor::Float(FloatSize::U8) => TypeTag::Float64,
        TypeDescriptor::FixedAscii(_) | TypeDescriptor::VarLenAscii => TypeTag::Bytes,
        TypeDescriptor::FixedUnicode(_) | TypeDescriptor::VarLenUnicode => TypeTag::String,
        TypeDescriptor::Compound(_) => TypeTag::Compound,
        TypeDescriptor::Enum(_) => TypeTag::Enum,
        TypeDescriptor::FixedArray(..) => TypeTag::Array,
        TypeDescriptor::VarLenArray(_) => TypeTag::Vlen,
        #[allow(unreachable_patterns)]
        _ => TypeTag::Opaque,
    }
}
