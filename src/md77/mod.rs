//! Core 1C:Enterprise 7.7 metadata reader module
//!
//! Pipeline: raw stream → [`sniffer`] (with [`codec`]) → plain text →
//! [`parser`] → [`Node`](models::Node) tree → [`analyzer`] → indices →
//! [`dump`].

pub mod analyzer;
pub mod codec;
pub mod dump;
pub mod error;
pub mod models;
pub mod parser;
pub mod sniffer;
pub mod storage;
pub mod text;
mod reader;

pub use error::{MdError, Result};
pub use reader::{MdReader, MetadataTree, ReaderOptions, DEFAULT_METADATA_STREAM};
