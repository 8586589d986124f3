pub mod container;
pub mod engine;
pub mod value_diff;
pub mod walker;

pub use container::{open_container, ContainerFormat, MemoryDataset, MemoryGroup};
pub use engine::{DiffEngine, DiffOptions};
pub use value_diff::{compare_values, ValueOutcome};
pub use walker::{walk, Entry, GroupListing, UnrecognizedPolicy};
