//! Reader session over one container: stream text and the decoded metadata tree

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::{info, warn};

use super::analyzer::Indices;
use super::dump;
use super::error::{MdError, Result};
use super::models::{Node, StorageEntry, StreamContent};
use super::storage::CompoundStorage;
use super::{parser, sniffer, text};

/// Where the platform keeps the configuration metadata.
pub const DEFAULT_METADATA_STREAM: &str = "Metadata\\Main MetaData Stream";

/// Streams whose name contains this are parsed rather than shown as text.
const METADATA_STREAM_MARKER: &str = "Main MetaData Stream";

const METADATA_HEADER: &str = "=== METADATA STRUCTURE ===";

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Path of the metadata stream inside the container.
    pub metadata_stream: String,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            metadata_stream: DEFAULT_METADATA_STREAM.to_string(),
        }
    }
}

/// A parsed metadata tree together with the indices derived from it.
///
/// The indices refer to this tree only and are dropped with it.
#[derive(Debug, Clone)]
pub struct MetadataTree {
    root: Node,
    indices: Indices,
}

impl MetadataTree {
    /// Analyze `root` and take ownership of it.
    pub fn new(root: Node) -> Self {
        let indices = Indices::build(&root);
        Self { root, indices }
    }

    /// Parse decoded plain text starting at its first `{`.
    ///
    /// # Errors
    /// Returns `NoRootElement` if no brace appears within the scan window.
    pub fn from_text(text: &[u8]) -> Result<Self> {
        let offset = sniffer::find_text_brace(text).ok_or(MdError::NoRootElement)?;
        Ok(Self::new(parser::parse(&text[offset..])))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    /// Re-run structural analysis, replacing all indices at once.
    pub fn reanalyze(&mut self) {
        self.indices = Indices::build(&self.root);
    }

    /// Node registered for an object id.
    pub fn object(&self, id: &[u8]) -> Option<&Node> {
        self.indices
            .objects
            .get(id)
            .and_then(|path| self.root.get(path))
    }

    /// Annotated dump of the whole tree.
    pub fn dump(&self) -> String {
        dump::dump_to_string(&self.root, &self.indices)
    }

    /// Annotated dump of any node of this tree.
    pub fn dump_node(&self, node: &Node) -> String {
        dump::dump_to_string(node, &self.indices)
    }

    /// Annotated dump of the object registered under `id`.
    pub fn dump_object(&self, id: &[u8]) -> Option<String> {
        self.object(id).map(|node| self.dump_node(node))
    }
}

/// The main reader for 1C:Enterprise 7.7 metadata containers.
///
/// Owns one opened container and at most one decoded metadata tree.
/// Opening another container means creating another reader.
pub struct MdReader<F> {
    storage: CompoundStorage<F>,
    options: ReaderOptions,
    metadata: Option<MetadataTree>,
}

impl MdReader<File> {
    /// Open a container file from disk.
    ///
    /// # Errors
    /// Returns `OpenContainer` if the file cannot be opened as a compound file.
    pub fn open(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        Ok(Self::with_storage(CompoundStorage::open(path)?, options))
    }
}

impl<F: Read + Seek> MdReader<F> {
    /// Open a container from any seekable reader.
    ///
    /// # Errors
    /// Returns `InvalidContainer` if the data is not a compound file.
    pub fn from_reader(inner: F, options: ReaderOptions) -> Result<Self> {
        Ok(Self::with_storage(CompoundStorage::from_reader(inner)?, options))
    }

    fn with_storage(storage: CompoundStorage<F>, options: ReaderOptions) -> Self {
        Self {
            storage,
            options,
            metadata: None,
        }
    }

    /// Directory tree of the container.
    pub fn entries(&self) -> &[StorageEntry] {
        self.storage.entries()
    }

    /// Raw bytes of one stream.
    pub fn read_raw(&mut self, path: &str) -> Result<Vec<u8>> {
        self.storage.read_stream(path)
    }

    /// Read one stream and classify it.
    pub fn decode_stream(&mut self, path: &str) -> Result<StreamContent> {
        let raw = self.read_raw(path)?;
        Ok(sniffer::decode(&raw))
    }

    /// Decode, parse and analyze the metadata stream.
    ///
    /// Once the stream has been read, any tree loaded earlier is dropped,
    /// even if decoding then fails.
    pub fn load_metadata(&mut self) -> Result<&MetadataTree> {
        let path = self.options.metadata_stream.clone();
        let raw = self.read_raw(&path)?;
        self.install_metadata(&path, &raw)
    }

    fn install_metadata(&mut self, path: &str, raw: &[u8]) -> Result<&MetadataTree> {
        self.metadata = None;
        let tree = match sniffer::decode(raw) {
            StreamContent::Decoded { bytes, .. } => MetadataTree::from_text(&bytes)?,
            StreamContent::Unrecognized(raw) => {
                return Err(MdError::UnrecognizedStream {
                    preview: text::hex_preview(&raw),
                })
            }
        };
        info!("Metadata loaded from {}", path);
        Ok(self.metadata.insert(tree))
    }

    /// The currently loaded metadata tree, if any.
    pub fn metadata(&self) -> Option<&MetadataTree> {
        self.metadata.as_ref()
    }

    /// Human-readable contents of one stream.
    ///
    /// The metadata stream is parsed and dumped (and becomes the current
    /// tree); other streams are shown as windows-1251 text; undecodable
    /// streams as a hex preview.
    pub fn read_stream_text(&mut self, path: &str) -> Result<String> {
        let raw = self.read_raw(path)?;
        if raw.is_empty() {
            return Ok("<empty stream>".to_string());
        }

        if path.contains(METADATA_STREAM_MARKER) {
            return match self.install_metadata(path, &raw) {
                Ok(tree) => Ok(format!("{}\n{}", METADATA_HEADER, tree.dump())),
                Err(MdError::UnrecognizedStream { preview }) => Ok(unknown_format(&preview)),
                Err(e) => Err(e),
            };
        }

        Ok(match sniffer::decode(&raw) {
            StreamContent::Decoded { bytes, .. } => text::decode_cp1251(&bytes).into_owned(),
            StreamContent::Unrecognized(raw) => {
                warn!("Stream {} is in an unknown format", path);
                unknown_format(&text::hex_preview(&raw))
            }
        })
    }
}

fn unknown_format(preview: &str) -> String {
    format!("Unknown data format (raw).\nHEX: {}", preview)
}
