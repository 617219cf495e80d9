//! Codec layer for decryption and decompression.
//!
//! # Submodules
//!
//! - [`crypto`][]: LCG stream cipher of encrypted streams
//! - [`compression`][]: zlib detection and inflation

pub mod compression;
pub mod crypto;
