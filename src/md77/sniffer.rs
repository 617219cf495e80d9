//! Stream classification (zlib / prefixed zlib / encrypted / plain text)

use log::debug;

use super::codec::{compression, crypto};
use super::models::{SniffRule, StreamContent};

/// Some streams carry an 8-byte header before the zlib payload.
const PREFIX_LEN: usize = 8;

/// How far into a stream to look for the opening brace of plain text.
pub const TEXT_SCAN_LIMIT: usize = 4096;

/// Classify a raw stream and turn it into plain-text bytes.
///
/// Rules are tried in a fixed order and the first match wins:
/// 1. zlib header at offset 0
/// 2. zlib header at offset 8 (the prefix is discarded)
/// 3. encrypted signature `0x25 0x77`, decrypted with an empty credential, zlib inside
/// 4. a `{` within the first 4096 bytes (the text is used from there on)
///
/// Anything else is returned as `Unrecognized`.
pub fn decode(raw: &[u8]) -> StreamContent {
    if compression::is_zlib(raw) {
        if let Some(bytes) = try_inflate(raw, "zlib at offset 0") {
            return decoded(SniffRule::Zlib, bytes);
        }
    }

    if raw.len() > PREFIX_LEN {
        let tail = &raw[PREFIX_LEN..];
        if compression::is_zlib(tail) {
            if let Some(bytes) = try_inflate(tail, "zlib at offset 8") {
                return decoded(SniffRule::ZlibAfterPrefix, bytes);
            }
        }
    }

    if raw.len() > crypto::HEADER_LEN && raw.starts_with(&crypto::SIGNATURE) {
        match crypto::decrypt(raw, crypto::EMPTY_CREDENTIAL) {
            Ok(plain) if compression::is_zlib(&plain) => {
                if let Some(bytes) = try_inflate(&plain, "encrypted zlib") {
                    return decoded(SniffRule::Encrypted, bytes);
                }
            }
            Ok(_) => debug!("Decrypted stream has no zlib header, falling through"),
            Err(e) => debug!("Decryption failed, falling through: {}", e),
        }
    }

    if let Some(offset) = find_text_brace(raw) {
        debug!("Plain text found at offset {}", offset);
        return decoded(SniffRule::PlainText, raw[offset..].to_vec());
    }

    debug!("No sniffing rule matched {} bytes", raw.len());
    StreamContent::Unrecognized(raw.to_vec())
}

/// Offset of the first `{` within the first 4096 bytes, if any.
pub fn find_text_brace(data: &[u8]) -> Option<usize> {
    let limit = data.len().min(TEXT_SCAN_LIMIT);
    data[..limit].iter().position(|&b| b == b'{')
}

fn try_inflate(payload: &[u8], what: &str) -> Option<Vec<u8>> {
    match compression::inflate(payload) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            debug!("Looked like {} but {}", what, e);
            None
        }
    }
}

fn decoded(rule: SniffRule, bytes: Vec<u8>) -> StreamContent {
    debug!("Stream decoded by rule {:?}: {} bytes", rule, bytes.len());
    StreamContent::Decoded { rule, bytes }
}
