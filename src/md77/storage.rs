//! Read-only access to the compound file (OLE structured storage) that
//! holds the configuration streams.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use cfb::CompoundFile;
use log::{debug, info};

use super::error::{MdError, Result};
use super::models::StorageEntry;

/// Separator the platform uses in stream paths.
pub const PATH_SEPARATOR: char = '\\';

/// An opened compound file together with its directory tree.
pub struct CompoundStorage<F> {
    file: CompoundFile<F>,
    entries: Vec<StorageEntry>,
}

impl CompoundStorage<File> {
    /// Open a compound file from disk and enumerate its entries.
    ///
    /// # Errors
    /// Returns `OpenContainer` if the file is missing, locked, or not a compound file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening compound file: {}", path.display());
        let file = cfb::open(path).map_err(|source| MdError::OpenContainer {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_compound(file)
    }
}

impl<F: Read + Seek> CompoundStorage<F> {
    /// Open a compound file from any seekable reader, e.g. an in-memory buffer.
    ///
    /// # Errors
    /// Returns `InvalidContainer` if the data is not a compound file.
    pub fn from_reader(inner: F) -> Result<Self> {
        let file = CompoundFile::open(inner).map_err(MdError::InvalidContainer)?;
        Self::from_compound(file)
    }

    fn from_compound(file: CompoundFile<F>) -> Result<Self> {
        let entries = collect_entries(&file, Path::new("/"), "")?;
        debug!("Compound file has {} top-level entries", entries.len());
        Ok(Self { file, entries })
    }

    /// Top-level entries, each with its nested children.
    pub fn entries(&self) -> &[StorageEntry] {
        &self.entries
    }

    /// Read a whole stream addressed by its backslash-separated path.
    pub fn read_stream(&mut self, path: &str) -> Result<Vec<u8>> {
        let cfb_path = to_cfb_path(path);
        if !self.file.is_stream(&cfb_path) {
            return Err(MdError::StreamNotFound(path.to_string()));
        }

        let mut stream = self.file.open_stream(&cfb_path)?;
        let mut data = Vec::with_capacity(stream.len() as usize);
        stream.read_to_end(&mut data)?;
        debug!("Read stream {}: {} bytes", path, data.len());
        Ok(data)
    }
}

fn to_cfb_path(path: &str) -> PathBuf {
    let mut cfb_path = PathBuf::from("/");
    for part in path.split(PATH_SEPARATOR).filter(|p| !p.is_empty()) {
        cfb_path.push(part);
    }
    cfb_path
}

fn collect_entries<F: Read + Seek>(
    file: &CompoundFile<F>,
    dir: &Path,
    parent: &str,
) -> Result<Vec<StorageEntry>> {
    let mut entries = Vec::new();
    for entry in file.read_storage(dir)? {
        let name = entry.name().to_string();
        let path = if parent.is_empty() {
            name.clone()
        } else {
            format!("{}{}{}", parent, PATH_SEPARATOR, name)
        };

        let children = if entry.is_storage() {
            collect_entries(file, entry.path(), &path)?
        } else {
            Vec::new()
        };

        entries.push(StorageEntry {
            name,
            path,
            is_container: entry.is_storage(),
            size: entry.len(),
            children,
        });
    }
    Ok(entries)
}
