//! Owned in-memory container tree.

use h5compare_common::{
    AttrMap, ContainerDataset, ContainerGroup, ContainerObject, Result, TypeTag, Value,
};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum MemoryNode {
    Group(Arc<MemoryGroup>),
    Dataset(Arc<MemoryDataset>),
    Other(String),
}

/// A group held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryGroup {
    name: String,
    attrs: AttrMap,
    children: BTreeMap<String, MemoryNode>,
}

impl MemoryGroup {
    pub fn new() -> Self {
        Self::named("/")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: AttrMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, tag: TypeTag) -> Self {
        self.attrs.insert(name.into(), tag);
        self
    }

    pub fn with_group(mut self, name: impl Into<String>, group: MemoryGroup) -> Self {
        self.insert_group(name, group);
        self
    }

    pub fn with_dataset(mut self, name: impl Into<String>, dataset: MemoryDataset) -> Self {
        self.insert_dataset(name, dataset);
        self
    }

    /// Adds a child of a kind that is neither group nor dataset
    pub fn with_other(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.insert_other(name, kind);
        self
    }

    pub fn insert_attr(&mut self, name: impl Into<String>, tag: TypeTag) {
        self.attrs.insert(name.into(), tag);
    }

    pub fn insert_group(&mut self, name: impl Into<String>, group: MemoryGroup) {
        self.children
            .insert(name.into(), MemoryNode::Group(Arc::new(group)));
    }

    pub fn insert_dataset(&mut self, name: impl Into<String>, dataset: MemoryDataset) {
        self.children
            .insert(name.into(), MemoryNode::Dataset(Arc::new(dataset)));
    }

    pub fn insert_other(&mut self, name: impl Into<String>, kind: impl Into<String>) {
        self.children
            .insert(name.into(), MemoryNode::Other(kind.into()));
    }
}

// Deep chains of nested groups are released with an explicit stack
impl Drop for MemoryGroup {
    fn drop(&mut self) {
        let mut stack: Vec<MemoryNode> = std::mem::take(&mut self.children).into_values().collect();
        while let Some(node) = stack.pop() {
            if let MemoryNode::Group(group) = node {
                if let Ok(mut group) = Arc::try_unwrap(group) {
                    stack.extend(std::mem::take(&mut group.children).into_values());
                }
            }
        }
    }
}

impl ContainerGroup for MemoryGroup {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn attrs(&self) -> Result<AttrMap> {
        Ok(self.attrs.clone())
    }

    fn items(&self) -> Result<Vec<(String, ContainerObject)>> {
        Ok(self
            .children
            .iter()
            .map(|(name, node)| {
                let object = match node {
                    MemoryNode::Group(group) => ContainerObject::Group(Box::new(Arc::clone(group))),
                    MemoryNode::Dataset(dataset) => {
                        ContainerObject::Dataset(Box::new(Arc::clone(dataset)))
                    }
                    MemoryNode::Other(kind) => ContainerObject::Other { kind: kind.clone() },
                };
                (name.clone(), object)
            })
            .collect())
    }
}

/// A dataset held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    dtype: TypeTag,
    value: Value,
    attrs: AttrMap,
}

impl MemoryDataset {
    pub fn new(dtype: TypeTag, value: Value) -> Self {
        Self {
            dtype,
            value,
            attrs: AttrMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, tag: TypeTag) -> Self {
        self.attrs.insert(name.into(), tag);
        self
    }
}

impl ContainerDataset for MemoryDataset {
    fn attrs(&self) -> Result<AttrMap> {
        Ok(self.attrs.clone())
    }

    fn dtype(&self) -> Result<TypeTag> {
        Ok(self.dtype)
    }

    fn value(&self) -> Result<Value> {
        Ok(self.value.clone())
    }
}
