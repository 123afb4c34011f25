//! Sub-structure placement and cipher.
//!
//! The 48 bytes after a record header hold four 12-byte sub-structures
//! (growth, attacks, conditions, miscellaneous).  Their physical order is one
//! of the 24 permutations of four, chosen by `personality % 24`, and every
//! 32-bit word is XORed with the record's cipher key.

use byteorder::{ByteOrder, LittleEndian};

pub const SUBSTRUCT_SIZE:   usize = 12;
pub const SUBSTRUCT_COUNT:  usize = 4;
pub const SUBSTRUCT_OFFSET: usize = 32;
pub const SUBSTRUCT_BYTES:  usize = SUBSTRUCT_SIZE * SUBSTRUCT_COUNT;

pub const GROWTH:     usize = 0;
pub const ATTACKS:    usize = 1;
pub const CONDITIONS: usize = 2;
pub const MISC:       usize = 3;

pub type Substructs = [[u8; SUBSTRUCT_SIZE]; SUBSTRUCT_COUNT];

/// `ORDER[personality % 24][canonical]` is the physical slot holding that
/// canonical sub-structure.
const ORDER: [[usize; SUBSTRUCT_COUNT]; 24] = [
    [0, 1, 2, 3], [0, 1, 3, 2], [0, 2, 1, 3], [0, 3, 1, 2], [0, 2, 3, 1], [0, 3, 2, 1],
    [1, 0, 2, 3], [1, 0, 3, 2], [2, 0, 1, 3], [3, 0, 1, 2], [2, 0, 3, 1], [3, 0, 2, 1],
    [1, 2, 0, 3], [1, 3, 0, 2], [2, 1, 0, 3], [3, 1, 0, 2], [2, 3, 0, 1], [3, 2, 0, 1],
    [1, 2, 3, 0], [1, 3, 2, 0], [2, 1, 3, 0], [3, 1, 2, 0], [2, 3, 1, 0], [3, 2, 1, 0],
];

pub fn permutation(personality: u32) -> &'static [usize; SUBSTRUCT_COUNT] {
    &ORDER[(personality % 24) as usize]
}

/// Physical bytes → canonical sub-structures.
pub fn unshuffle(physical: &[u8], personality: u32) -> Substructs {
    let mut out = [[0u8; SUBSTRUCT_SIZE]; SUBSTRUCT_COUNT];
    for (canonical, &slot) in permutation(personality).iter().enumerate() {
        let start = slot * SUBSTRUCT_SIZE;
        out[canonical].copy_from_slice(&physical[start..start + SUBSTRUCT_SIZE]);
    }
    out
}

/// Canonical sub-structures → physical bytes.
pub fn shuffle(canonical: &Substructs, personality: u32) -> [u8; SUBSTRUCT_BYTES] {
    let mut out = [0u8; SUBSTRUCT_BYTES];
    for (index, &slot) in permutation(personality).iter().enumerate() {
        let start = slot * SUBSTRUCT_SIZE;
        out[start..start + SUBSTRUCT_SIZE].copy_from_slice(&canonical[index]);
    }
    out
}

/// XOR every little-endian word with `key`.  Encrypts and decrypts.
pub fn apply_cipher(bytes: &mut [u8], key: u32) {
    for word in bytes.chunks_exact_mut(4) {
        let value = LittleEndian::read_u32(word) ^ key;
        LittleEndian::write_u32(word, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_order_is_a_bijection() {
        for personality in 0..24u32 {
            let mut seen = [false; SUBSTRUCT_COUNT];
            for &slot in permutation(personality) {
                assert!(!seen[slot]);
                seen[slot] = true;
            }
        }
        assert_eq!(permutation(24), permutation(0));
    }

    #[test]
    fn shuffle_places_growth_by_personality() {
        let canonical: Substructs = [[0xA0; 12], [0xA1; 12], [0xA2; 12], [0xA3; 12]];
        // personality 9 → [3, 0, 1, 2]: growth lives in the last slot
        let physical = shuffle(&canonical, 9);
        assert_eq!(physical[36], 0xA0);
        assert_eq!(physical[0], 0xA1);
        assert_eq!(unshuffle(&physical, 9), canonical);
    }

    #[test]
    fn cipher_is_symmetric() {
        let original: Vec<u8> = (0u8..12).collect();
        let mut bytes = original.clone();
        apply_cipher(&mut bytes, 0xDEAD_BEEF);
        assert_ne!(bytes, original);
        apply_cipher(&mut bytes, 0xDEAD_BEEF);
        assert_eq!(bytes, original);
    }
}
