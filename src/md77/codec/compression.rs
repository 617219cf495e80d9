//! zlib decompression for container streams.

use std::io::Read;

use flate2::read::ZlibDecoder;
use log::trace;

use crate::md77::error::{MdError, Result};

/// Whether the buffer starts with a zlib header the platform writes.
///
/// Byte 0 must be `0x78` (deflate, 32K window); byte 1 one of the three
/// check bytes for the default, best and fastest compression levels.
pub fn is_zlib(data: &[u8]) -> bool {
    matches!(data, [0x78, 0x9C | 0xDA | 0x01, ..])
}

/// Inflate a complete zlib stream.
///
/// # Errors
/// Returns `DecompressionError` if the stream is corrupted or truncated.
pub fn inflate(payload: &[u8]) -> Result<Vec<u8>> {
    trace!("Decompressing with Zlib: {} bytes", payload.len());

    let mut output = Vec::with_capacity(payload.len().saturating_mul(4));
    let mut decoder = ZlibDecoder::new(payload);
    decoder
        .read_to_end(&mut output)
        .map_err(|e| MdError::DecompressionError(format!("Zlib decompression failed: {}", e)))?;
    Ok(output)
}
