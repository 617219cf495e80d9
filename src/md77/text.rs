//! Display helpers: codepage transcoding and hex previews

use std::borrow::Cow;

use encoding_rs::WINDOWS_1251;

/// Number of leading bytes shown for streams that could not be decoded.
pub const HEX_PREVIEW_LEN: usize = 32;

/// Transcode single-byte Cyrillic (windows-1251) text for display.
///
/// Every byte maps to a character in this codepage, so the conversion is lossless.
pub fn decode_cp1251(bytes: &[u8]) -> Cow<'_, str> {
    WINDOWS_1251.decode_without_bom_handling(bytes).0
}

/// Space-separated lowercase hex of the first 32 bytes, e.g. `25 77 0a`.
pub fn hex_preview(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(HEX_PREVIEW_LEN)
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}
