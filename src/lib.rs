//! # md77-reader
//!
//! A reader for 1C:Enterprise 7.7 metadata containers (`1Cv7.md`).
//! Opens the compound file, decodes zlib-compressed or encrypted streams,
//! parses the brace-list metadata text into a tree and cross-references
//! documents, catalogs, registers and their fields.
//!
//! **Note:** The format is only read; there is no write path.
pub mod md77;

// Re-export the main types for convenience
pub use md77::{
    analyzer::Indices,
    models::{Node, NodePath, SectionType, SniffRule, StorageEntry, StreamContent},
    MdError, MdReader, MetadataTree, ReaderOptions, Result, DEFAULT_METADATA_STREAM,
};
