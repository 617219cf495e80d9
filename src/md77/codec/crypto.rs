//! Stream cipher used by encrypted 1C:Enterprise 7.7 streams.
//!
//! Encrypted stream layout:
//! - Bytes 0-1: Signature `0x25 0x77`
//! - Bytes 2-5: Nonce (little-endian u32)
//! - Bytes 6-7: Unused
//! - Bytes 8+:  Payload XORed with an LCG keystream

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::md77::error::{MdError, Result};

/// Signature of an encrypted stream.
pub const SIGNATURE: [u8; 2] = [0x25, 0x77];

/// Length of the header preceding the encrypted payload.
pub const HEADER_LEN: usize = 8;

/// The only credential that can be supplied today: no interface passes a
/// per-file password, so every encrypted stream is opened with this one.
pub const EMPTY_CREDENTIAL: &[u8] = b"";

const LCG_MUL: u32 = 0x0808_8405;
const LCG_INC: u32 = 1;

/// Derive the initial keystream state.
///
/// Algorithm:
/// 1. Fold the credential: `key = key * 4 + byte` for each byte (wrapping)
/// 2. XOR with the nonce
///
/// With an empty credential the key is the nonce itself.
pub fn derive_key(credential: &[u8], nonce: u32) -> u32 {
    let folded = credential
        .iter()
        .fold(0u32, |key, &b| key.wrapping_mul(4).wrapping_add(b as u32));
    folded ^ nonce
}

/// Read the nonce embedded in an encrypted stream header.
pub fn read_nonce(data: &[u8]) -> Result<u32> {
    if data.len() < HEADER_LEN {
        return Err(MdError::Truncated {
            context: "encrypted stream header",
            expected: HEADER_LEN,
            found: data.len(),
        });
    }
    Ok(LittleEndian::read_u32(&data[2..6]))
}

/// XOR `data` in place with the keystream seeded by `key`.
///
/// Each byte is XORed with the low byte of the state, then the state
/// advances as `state * 0x08088405 + 1`. Applying it twice restores the input.
pub fn apply_keystream(data: &mut [u8], key: u32) {
    trace!("Applying LCG keystream to {} bytes", data.len());

    let mut state = key;
    for byte in data.iter_mut() {
        *byte ^= (state & 0xFF) as u8;
        state = state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
    }
}

/// Decrypt a whole encrypted stream, returning the payload without its 8-byte header.
pub fn decrypt(data: &[u8], credential: &[u8]) -> Result<Vec<u8>> {
    let nonce = read_nonce(data)?;
    let key = derive_key(credential, nonce);
    trace!("Decrypting {} bytes (nonce={:#010x})", data.len() - HEADER_LEN, nonce);

    let mut payload = data[HEADER_LEN..].to_vec();
    apply_keystream(&mut payload, key);
    Ok(payload)
}
