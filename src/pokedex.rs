//! Seen / caught bitmasks ⇄ per-species status.
//!
//! The two layouts number their bits differently:
//!
//! - V1: bit `k` is species `k + 1`; caught overrides seen, and the seen and
//!   caught counters are tallied independently.
//! - V2: bit `i` is species `i` (bit 0 unused).  A set caught bit means
//!   caught and counts towards both counters.  A species with *both* bits set
//!   is the V2 marker for a shiny capture.
//!
//! [`PokedexState::entries`] is normalized to `entries[k]` = species `k + 1`
//! for both layouts, so a V1 state can be fed straight into a V2
//! [`to_bitmasks`].

use serde::Serialize;

use crate::mon::PokemonRecord;
use crate::profile::{FormatVersion, SPECIES_COUNT_V1};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DexStatus {
    #[default]
    Unseen,
    Seen,
    Caught,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PokedexState {
    #[serde(skip)]
    pub entries: Vec<DexStatus>,
    pub seen:    usize,
    pub caught:  usize,
}

impl PokedexState {
    /// Status of a 1-based species id.
    pub fn status(&self, species: u16) -> DexStatus {
        match species {
            0 => DexStatus::Unseen,
            n => self.entries.get(n as usize - 1).copied().unwrap_or_default(),
        }
    }
}

fn bit(mask: &[u8], index: usize) -> bool {
    mask.get(index / 8).map_or(false, |b| b & (1 << (index % 8)) != 0)
}

fn set_bit(mask: &mut [u8], index: usize) {
    if let Some(b) = mask.get_mut(index / 8) {
        *b |= 1 << (index % 8);
    }
}

pub fn to_status_array(seen_mask: &[u8], caught_mask: &[u8], version: FormatVersion) -> PokedexState {
    let bits = seen_mask.len().min(caught_mask.len()) * 8;
    let mut state = PokedexState::default();

    match version {
        FormatVersion::V1 => {
            state.entries = vec![DexStatus::Unseen; bits];
            for k in 0..bits {
                if bit(seen_mask, k) {
                    state.entries[k] = DexStatus::Seen;
                    state.seen += 1;
                }
                if bit(caught_mask, k) {
                    state.entries[k] = DexStatus::Caught;
                    state.caught += 1;
                }
            }
        }
        FormatVersion::V2 => {
            state.entries = vec![DexStatus::Unseen; bits.saturating_sub(1)];
            for i in 1..bits {
                if bit(caught_mask, i) {
                    state.entries[i - 1] = DexStatus::Caught;
                    state.seen += 1;
                    state.caught += 1;
                } else if bit(seen_mask, i) {
                    state.entries[i - 1] = DexStatus::Seen;
                    state.seen += 1;
                }
            }
        }
    }
    state
}

/// Merge `entries` (and the shiny records among `records`) into copies of the
/// current masks.
///
/// Only the V2 direction exists; for V1 the masks come back unchanged.  Bits
/// are only ever set, apart from the unused bit 0.
pub fn to_bitmasks<'a, I>(
    entries:     &[DexStatus],
    records:     I,
    seen_mask:   &[u8],
    caught_mask: &[u8],
    version:     FormatVersion,
) -> (Vec<u8>, Vec<u8>)
where
    I: IntoIterator<Item = &'a PokemonRecord>,
{
    let mut seen   = seen_mask.to_vec();
    let mut caught = caught_mask.to_vec();
    if version == FormatVersion::V1 {
        return (seen, caught);
    }

    for mask in [&mut seen, &mut caught] {
        if let Some(first) = mask.first_mut() {
            *first &= !1;
        }
    }

    let last = SPECIES_COUNT_V1 as usize;
    for species in 1..=last {
        match entries.get(species - 1) {
            Some(DexStatus::Seen)   => set_bit(&mut seen, species),
            Some(DexStatus::Caught) => set_bit(&mut caught, species),
            _ => {}
        }
    }

    for record in records {
        let species = record.species() as usize;
        if record.shiny && (1..=last).contains(&species) {
            set_bit(&mut seen, species);
            set_bit(&mut caught, species);
        }
    }
    (seen, caught)
}

/// Mark every species seen and caught.
pub fn fill(mask: &mut [u8]) {
    mask.fill(0xFF);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mon::decode;
    use crate::profile::PROFILE_V2;

    #[test]
    fn v1_caught_overrides_seen_and_counts_independently() {
        let seen   = [0b0000_0011u8, 0];
        let caught = [0b0000_0010u8, 0b1000_0000];
        let state = to_status_array(&seen, &caught, FormatVersion::V1);
        assert_eq!(state.entries.len(), 16);
        assert_eq!(state.status(1), DexStatus::Seen);
        assert_eq!(state.status(2), DexStatus::Caught);
        assert_eq!(state.status(16), DexStatus::Caught);
        assert_eq!(state.status(3), DexStatus::Unseen);
        assert_eq!((state.seen, state.caught), (2, 2));
    }

    #[test]
    fn v2_caught_counts_as_seen_too() {
        let seen   = [0b0000_0010u8, 0b0000_0001];
        let caught = [0b0000_0100u8, 0];
        let state = to_status_array(&seen, &caught, FormatVersion::V2);
        assert_eq!(state.entries.len(), 15);
        assert_eq!(state.status(1), DexStatus::Seen);
        assert_eq!(state.status(2), DexStatus::Caught);
        assert_eq!(state.status(8), DexStatus::Seen);
        assert_eq!((state.seen, state.caught), (3, 1));
    }

    #[test]
    fn v2_round_trip_is_idempotent() {
        let n = PROFILE_V2.dex_size;
        let mut seen   = vec![0u8; n];
        let mut caught = vec![0u8; n];
        for species in [1usize, 25, 150, 898] {
            set_bit(&mut seen, species);
        }
        for species in [4usize, 151, 600] {
            set_bit(&mut caught, species);
        }

        let state = to_status_array(&seen, &caught, FormatVersion::V2);
        let blank = vec![0u8; n];
        let (s2, c2) = to_bitmasks(&state.entries, std::iter::empty(), &blank, &blank, FormatVersion::V2);
        let again = to_status_array(&s2, &c2, FormatVersion::V2);
        assert_eq!(again, state);
    }

    #[test]
    fn v1_state_lands_on_v2_bit_numbering() {
        // V1 bit 0 is species 1; V2 stores it at bit 1.
        let state = to_status_array(&[0b0000_0001], &[0b0000_0100], FormatVersion::V1);
        let (seen, caught) = to_bitmasks(&state.entries, std::iter::empty(), &[0xFF, 0], &[0, 0], FormatVersion::V2);
        assert_eq!(seen[0], 0xFF & !1);
        assert_eq!(caught[0], 0b0000_1000);
    }

    #[test]
    fn v1_inverse_is_pass_through() {
        let (s, c) = to_bitmasks(&[DexStatus::Caught; 8], std::iter::empty(), &[1, 2], &[3, 4], FormatVersion::V1);
        assert_eq!((s, c), (vec![1, 2], vec![3, 4]));
    }

    #[test]
    fn shiny_records_set_both_bits() {
        // V1 ids that satisfy the shiny threshold; personality % 24 == 0 and a
        // zero cipher key keep the growth block in plaintext at offset 32.
        let mut raw = [0u8; 80];
        raw[0..4].copy_from_slice(&0x0001_0008u32.to_le_bytes());
        raw[4..8].copy_from_slice(&0x0001_0008u32.to_le_bytes());
        raw[32..34].copy_from_slice(&10u16.to_le_bytes());
        let mon = decode(&raw, FormatVersion::V1).unwrap();
        assert!(mon.shiny);
        assert_eq!(mon.species(), 10);

        let (seen, caught) = to_bitmasks(&[], [&mon], &[0, 0], &[0, 0], FormatVersion::V2);
        assert_eq!(seen[1], 0b0000_0100);
        assert_eq!(caught[1], 0b0000_0100);
    }

    #[test]
    fn shiny_species_zero_leaves_bit_zero_clear() {
        // shiny ids, zero growth block → species 0
        let mut raw = [0u8; 80];
        raw[0..4].copy_from_slice(&0x0001_0008u32.to_le_bytes());
        raw[4..8].copy_from_slice(&0x0001_0008u32.to_le_bytes());
        let mon = decode(&raw, FormatVersion::V1).unwrap();
        assert!(mon.shiny);
        assert_eq!(mon.species(), 0);

        let (seen, caught) = to_bitmasks(&[], [&mon], &[0xFF, 0], &[0xFF, 0], FormatVersion::V2);
        assert_eq!(seen[0] & 1, 0);
        assert_eq!(caught[0] & 1, 0);
        assert_eq!(seen[0], 0xFE);
    }

    #[test]
    fn fill_sets_every_bit() {
        let mut mask = vec![0u8; 4];
        fill(&mut mask);
        let state = to_status_array(&mask, &mask, FormatVersion::V2);
        assert_eq!(state.caught, 31);
        assert!(state.entries.iter().all(|&s| s == DexStatus::Caught));
    }
}
