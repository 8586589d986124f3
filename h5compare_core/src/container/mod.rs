pub mod memory;
pub mod snapshot;

#[cfg(feature = "hdf5")]
pub mod h5;

#[cfg(test)]
mod tests_snapshot;

#[cfg(all(test, feature = "hdf5"))]
mod tests_h5;

pub use memory::{MemoryDataset, MemoryGroup};
pub use snapshot::{is_snapshot_file, load_snapshot, parse_snapshot};

use h5compare_common::{ContainerGroup, H5CompareError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const HDF5_SIGNATURE: &[u8; 8] = b"\x89HDF\r\n\x1a\n";

/// Container file formats understood by `open_container`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerFormat {
    /// Pick by extension, then by file signature
    #[default]
    Auto,
    Snapshot,
    Hdf5,
}

/// Opens the root group of a container file.
///
/// Every failure, including unreadable or malformed content, is reported as
/// `H5CompareError::FileOpen` for `path`.
pub fn open_container(path: &Path, format: ContainerFormat) -> Result<Box<dyn ContainerGroup>> {
    let label = path.display().to_string();
    debug!("Opening {} as {:?}", label, format);

    match format {
        // Detection never yields Auto
        ContainerFormat::Auto => open_container(path, detect_format(path)?),
        ContainerFormat::Snapshot => load_snapshot(path)
            .map(|root| Box::new(root) as Box<dyn ContainerGroup>)
            .map_err(|e| H5CompareError::file_open(label, e)),
        ContainerFormat::Hdf5 => open_hdf5_root(path),
    }
}

#[cfg(feature = "hdf5")]
fn open_hdf5_root(path: &Path) -> Result<Box<dyn ContainerGroup>> {
    h5::open_hdf5(path).map(|root| Box::new(root) as Box<dyn ContainerGroup>)
}

#[cfg(not(feature = "hdf5"))]
fn open_hdf5_root(path: &Path) -> Result<Box<dyn ContainerGroup>> {
    Err(H5CompareError::file_open(
        path.display().to_string(),
        "HDF5 support not compiled in (enable the 'hdf5' feature)",
    ))
}

/// Determines the container format from the extension, falling back to the
/// leading bytes of the file
pub fn detect_format(path: &Path) -> Result<ContainerFormat> {
    if let Some(format) = format_from_extension(path) {
        return Ok(format);
    }

    let label = path.display().to_string();
    let mut file = File::open(path).map_err(|e| H5CompareError::file_open(&label, e))?;
    let mut head = [0u8; 8];
    let read = file
        .read(&mut head)
        .map_err(|e| H5CompareError::file_open(&label, e))?;

    if read == HDF5_SIGNATURE.len() && &head == HDF5_SIGNATURE {
        Ok(ContainerFormat::Hdf5)
    } else if head[..read].iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{') {
        Ok(ContainerFormat::Snapshot)
    } else {
        Err(H5CompareError::file_open(label, "unrecognized container format"))
    }
}

fn format_from_extension(path: &Path) -> Option<ContainerFormat> {
    if is_snapshot_file(path) {
        return Some(ContainerFormat::Snapshot);
    }
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "h5" | "hdf5" | "hdf" | "he5" | "nc" => Some(ContainerFormat::Hdf5),
        _ => None,
    }
}
