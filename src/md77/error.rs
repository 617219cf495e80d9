//! Custom error types for the md77-reader crate.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum MdError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The compound-file container could not be opened (bad path, wrong format, locked file).
    #[error("Cannot open container {}: {source}", path.display())]
    OpenContainer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An in-memory or other non-file source is not a readable compound file.
    #[error("Cannot open container from reader: {0}")]
    InvalidContainer(#[source] std::io::Error),

    /// The requested stream does not exist inside the container.
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    /// A buffer is shorter than the fixed header it must carry.
    #[error("Truncated {context}: expected at least {expected} bytes, but found {found} bytes")]
    Truncated {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// An error occurred during decompression, usually corrupted data or a wrong guess about the layout.
    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    /// The decoded metadata stream has no opening brace to start parsing from.
    #[error("Decoded data has no root element '{{'")]
    NoRootElement,

    /// The metadata stream matched none of the known encodings.
    #[error("Unrecognized stream format (HEX: {preview})")]
    UnrecognizedStream { preview: String },
}

/// A convenience `Result` type alias using the crate's `MdError` type.
pub type Result<T> = std::result::Result<T, MdError>;
