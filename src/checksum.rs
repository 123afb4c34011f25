//! The two checksum algorithms of the save format.
//!
//! They look alike but are not interchangeable: sector payloads sum 32-bit
//! words and fold the carry, creature records sum 16-bit words and truncate.

use byteorder::{ByteOrder, LittleEndian};

/// Checksum stored in every sector footer.
///
/// Sums all little-endian `u32` words of `bytes` (trailing bytes that do not
/// fill a word are ignored) and folds the high half into the low half.
pub fn sector_checksum(bytes: &[u8]) -> u16 {
    let sum = bytes
        .chunks_exact(4)
        .fold(0u32, |acc, w| acc.wrapping_add(LittleEndian::read_u32(w)));
    ((sum >> 16).wrapping_add(sum) & 0xFFFF) as u16
}

/// Checksum stored in a creature record header, computed over the 48
/// plaintext sub-structure bytes.
pub fn record_checksum(bytes: &[u8]) -> u16 {
    bytes
        .chunks_exact(2)
        .fold(0u16, |acc, w| acc.wrapping_add(LittleEndian::read_u16(w)))
}
